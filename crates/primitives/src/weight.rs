use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU32;

use crate::ids::ParticipantId;
use crate::item::ParticipantWeight;

/// Proportional share unit of one participant. Always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight(NonZeroU32);

impl Weight {
	/// The weight a newly selected participant starts with.
	pub const ONE: Self = Self(NonZeroU32::MIN);

	/// Returns `None` for zero.
	pub const fn new(value: u32) -> Option<Self> {
		match NonZeroU32::new(value) {
			Some(v) => Some(Self(v)),
			None => None,
		}
	}

	/// Normalizes an externally supplied weight: missing or non-positive
	/// values become 1, oversized values saturate.
	pub fn from_external(value: Option<i64>) -> Self {
		match value {
			Some(v) if v > 0 => Self::new(u32::try_from(v).unwrap_or(u32::MAX)).unwrap_or(Self::ONE),
			_ => Self::ONE,
		}
	}

	/// Returns the raw integer weight.
	pub const fn get(self) -> u32 {
		self.0.get()
	}

	/// Applies `delta`, flooring the result at 1.
	pub fn offset(self, delta: i64) -> Self {
		let next = i64::from(self.get()).saturating_add(delta).clamp(1, i64::from(u32::MAX));
		Self::new(next as u32).unwrap_or(Self::ONE)
	}
}

impl Default for Weight {
	fn default() -> Self {
		Self::ONE
	}
}

impl fmt::Display for Weight {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.get())
	}
}

/// Selected participants and their weights for one line item.
///
/// Presence of a key means the participant is selected. Deselection removes
/// the key; a zero weight is unrepresentable. Equality is set-and-value
/// equality and ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WeightMap {
	entries: BTreeMap<ParticipantId, Weight>,
}

impl WeightMap {
	/// Creates an empty map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the weight for `id`, if selected.
	pub fn get(&self, id: &ParticipantId) -> Option<Weight> {
		self.entries.get(id).copied()
	}

	/// Returns true if `id` is selected.
	pub fn contains(&self, id: &ParticipantId) -> bool {
		self.entries.contains_key(id)
	}

	/// Selects `id` with `weight`, replacing any previous weight.
	pub fn insert(&mut self, id: ParticipantId, weight: Weight) -> Option<Weight> {
		self.entries.insert(id, weight)
	}

	/// Deselects `id`.
	pub fn remove(&mut self, id: &ParticipantId) -> Option<Weight> {
		self.entries.remove(id)
	}

	/// Removes `id` if selected, otherwise selects it with weight 1.
	///
	/// Returns true when the participant is selected afterwards.
	pub fn toggle(&mut self, id: &ParticipantId) -> bool {
		if self.entries.remove(id).is_some() {
			false
		} else {
			self.entries.insert(id.clone(), Weight::ONE);
			true
		}
	}

	/// Offsets the weight of a selected participant, flooring at 1.
	///
	/// Returns the new weight, or `None` if `id` is not selected.
	pub fn adjust(&mut self, id: &ParticipantId, delta: i64) -> Option<Weight> {
		let weight = self.entries.get_mut(id)?;
		*weight = weight.offset(delta);
		Some(*weight)
	}

	/// Keeps only the entries for which `keep` returns true.
	///
	/// Returns the removed participant ids.
	pub fn retain(&mut self, mut keep: impl FnMut(&ParticipantId) -> bool) -> Vec<ParticipantId> {
		let mut removed = Vec::new();
		self.entries.retain(|id, _| {
			let kept = keep(id);
			if !kept {
				removed.push(id.clone());
			}
			kept
		});
		removed
	}

	/// Sum of all weights.
	pub fn total_weight(&self) -> u64 {
		self.entries.values().map(|w| u64::from(w.get())).sum()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Iterates entries in participant id order.
	pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, Weight)> {
		self.entries.iter().map(|(id, w)| (id, *w))
	}

	/// Converts the map into a complete replacement set for the gateway.
	pub fn to_entries(&self) -> Vec<ParticipantWeight> {
		self.iter()
			.map(|(id, weight)| ParticipantWeight {
				participant_id: id.clone(),
				weight,
			})
			.collect()
	}

	/// Order-independent textual key, e.g. `alice:1,bob:3`.
	pub fn key(&self) -> String {
		let mut out = String::new();
		for (i, (id, weight)) in self.iter().enumerate() {
			if i > 0 {
				out.push(',');
			}
			out.push_str(id.as_str());
			out.push(':');
			out.push_str(&weight.get().to_string());
		}
		out
	}
}

impl FromIterator<(ParticipantId, Weight)> for WeightMap {
	fn from_iter<I: IntoIterator<Item = (ParticipantId, Weight)>>(iter: I) -> Self {
		Self {
			entries: iter.into_iter().collect(),
		}
	}
}

impl fmt::Display for WeightMap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{{{}}}", self.key())
	}
}

#[cfg(test)]
mod tests;
