//! Shared task primitives for Cashus background work.
//!
//! * [`spawn_named`] runs a future on the active Tokio runtime inside a
//!   named tracing span.
//! * [`GenerationClock`] and [`GenerationToken`] scope work to one owner
//!   lifecycle so late completions can detect that their owner is gone.
//! * [`DebounceTimer`] is a trailing-edge timer with at most one outstanding
//!   [`ScheduledTask`].

mod debounce;
mod spawn;
mod token;

pub use debounce::{DebounceTimer, ScheduledTask};
pub use spawn::spawn_named;
pub use token::{GenerationClock, GenerationToken};
