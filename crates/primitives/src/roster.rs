use std::collections::HashSet;
use std::sync::Arc;

use crate::ids::ParticipantId;
use crate::item::Participant;

/// Read-only set of participants currently eligible for selection.
///
/// Cheap to clone; shared between every store on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
	ids: Arc<HashSet<ParticipantId>>,
}

impl Roster {
	pub fn new(ids: impl IntoIterator<Item = ParticipantId>) -> Self {
		Self {
			ids: Arc::new(ids.into_iter().collect()),
		}
	}

	/// Builds a roster from a friends or collaborators list.
	pub fn from_participants<'a>(participants: impl IntoIterator<Item = &'a Participant>) -> Self {
		Self::new(participants.into_iter().map(|p| p.id.clone()))
	}

	pub fn contains(&self, id: &ParticipantId) -> bool {
		self.ids.contains(id)
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}
}

impl FromIterator<ParticipantId> for Roster {
	fn from_iter<I: IntoIterator<Item = ParticipantId>>(iter: I) -> Self {
		Self::new(iter)
	}
}
