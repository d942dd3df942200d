//! Core types for bill splitting: participants, weights, amounts, and line items.

/// Decimal money amounts parsed from strings.
pub mod amount;
/// Identifier types for splitting entities.
pub mod ids;
/// Line items and the participants attached to them.
pub mod item;
/// Eligible participant rosters.
pub mod roster;
/// Share derivation over weight maps.
pub mod share;
/// Participant weights and weight maps.
pub mod weight;

pub use amount::{Amount, AmountError};
pub use ids::{LineItemId, ParticipantId};
pub use item::{AuthorityEntry, LineItem, Participant, ParticipantWeight};
pub use roster::Roster;
pub use share::{allocate_minor_units, compute_share};
pub use weight::{Weight, WeightMap};
