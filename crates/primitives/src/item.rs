use std::num::NonZeroU32;

use crate::amount::{Amount, AmountError};
use crate::ids::{LineItemId, ParticipantId};
use crate::weight::{Weight, WeightMap};

/// A friend or collaborator that can take part in a split.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Participant {
	pub id: ParticipantId,
	pub display_name: String,
	#[cfg_attr(feature = "serde", serde(default))]
	pub avatar: Option<String>,
	/// True when this participant is the acting user.
	#[cfg_attr(feature = "serde", serde(default))]
	pub is_self: bool,
}

impl Participant {
	pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			display_name: display_name.into(),
			avatar: None,
			is_self: false,
		}
	}
}

/// One `(participant, weight)` pair of a complete membership set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantWeight {
	pub participant_id: ParticipantId,
	pub weight: Weight,
}

/// One participant entry as supplied by an authoritative refresh.
///
/// The weight is raw: absent or non-positive values are normalized to 1.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuthorityEntry {
	pub participant_id: ParticipantId,
	#[cfg_attr(feature = "serde", serde(default))]
	pub weight: Option<i64>,
}

impl AuthorityEntry {
	pub fn new(participant_id: impl Into<ParticipantId>, weight: Option<i64>) -> Self {
		Self {
			participant_id: participant_id.into(),
			weight,
		}
	}

	/// Converts a slice of entries into a weight map. Later duplicates win.
	pub fn to_weight_map(entries: &[AuthorityEntry]) -> WeightMap {
		entries
			.iter()
			.map(|e| (e.participant_id.clone(), Weight::from_external(e.weight)))
			.collect()
	}
}

/// A splittable line item of an expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
	pub id: LineItemId,
	pub amount: Amount,
	pub quantity: NonZeroU32,
	pub participants: Vec<AuthorityEntry>,
}

impl LineItem {
	/// Builds an item from its decimal amount string.
	pub fn new(id: impl Into<LineItemId>, amount: &str, quantity: u32) -> Result<Self, AmountError> {
		Ok(Self {
			id: id.into(),
			amount: Amount::parse(amount)?,
			quantity: NonZeroU32::new(quantity).unwrap_or(NonZeroU32::MIN),
			participants: Vec::new(),
		})
	}

	#[must_use]
	pub fn with_participant(mut self, id: impl Into<ParticipantId>, weight: i64) -> Self {
		self.participants.push(AuthorityEntry::new(id, Some(weight)));
		self
	}

	/// Amount times quantity.
	pub fn total(&self) -> Result<Amount, AmountError> {
		self.amount.times(self.quantity.get())
	}

	/// The item's current participants as a weight map.
	pub fn weights(&self) -> WeightMap {
		AuthorityEntry::to_weight_map(&self.participants)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_authority_entries_default_missing_weights() {
		let entries = vec![
			AuthorityEntry::new("a", None),
			AuthorityEntry::new("b", Some(0)),
			AuthorityEntry::new("c", Some(3)),
		];
		let weights = AuthorityEntry::to_weight_map(&entries);
		assert_eq!(weights.key(), "a:1,b:1,c:3");
	}

	#[test]
	fn test_zero_quantity_is_treated_as_one() {
		let item = LineItem::new("item", "4.00", 0).unwrap();
		assert_eq!(item.quantity.get(), 1);
		assert_eq!(item.total().unwrap().to_string(), "4.00");
	}
}
