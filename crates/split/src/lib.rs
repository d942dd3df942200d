//! Optimistic participant weight sync for splittable line items.
//!
//! A [`ParticipantWeightStore`] lets a user toggle participants and adjust
//! their weights on one line item while it keeps the edits synchronized
//! with the server through a [`SyncGateway`]:
//!
//! - edits apply locally at once and are debounced (trailing edge)
//! - one sync call is in flight at a time, carrying the full membership
//! - failures revert to the last confirmed state and raise a [`Notice`]
//! - authoritative refreshes never clobber unsynced edits
//!
//! The pure state machine lives in [`WeightSyncState`]; the store adds
//! timers, gateway calls, lifecycle, and change subscriptions.

pub mod config;
pub mod error;
pub mod gateway;
pub mod state;
pub mod store;

pub use config::{ConfigError, SplitConfig};
pub use error::{Error, Result, SyncError};
pub use gateway::{Level, Notice, Notifier, SyncGateway, TracingNotifier};
pub use state::{CompleteOutcome, ReconcileOutcome, SyncPhase, SyncStats, WeightSnapshot, WeightSyncState};
pub use store::ParticipantWeightStore;
