//! Per-item weight sync state with owned local, pending, and server snapshots.
//!
//! [`WeightSyncState`] tracks three weight maps for one line item:
//! - `local`: the user's in-progress edits, updated on every toggle/adjust
//! - `pending_sync`: the snapshot currently sent to the gateway
//! - `server_truth`: the last map known to be persisted
//!
//! It is a synchronous state machine. Timers and network calls live in
//! [`ParticipantWeightStore`](crate::ParticipantWeightStore), which drives
//! it between suspension points.
//!
//! # Reconciliation
//!
//! Authority updates replace `local` only while there is no unsynced edit
//! and no sync in flight. Otherwise the update is deferred and re-evaluated
//! when the store settles back to idle.

use cashus_primitives::{
	Amount, AuthorityEntry, LineItem, LineItemId, ParticipantId, Roster, WeightMap, allocate_minor_units,
	compute_share,
};
use tracing::debug;

use crate::error::SyncError;

/// Current phase of an item's sync state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncPhase {
	/// `local` matches `server_truth`; nothing to send.
	#[default]
	Idle,
	/// Local edits are waiting for the debounce to elapse.
	Editing,
	/// A sync call is in flight.
	Syncing,
}

/// Result of feeding an authoritative participant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
	/// The update replaced `local` and `server_truth`.
	Applied,
	/// The update matched what is already shown.
	Unchanged,
	/// Unsynced edits or an in-flight sync blocked the update; it was recorded.
	Deferred,
}

/// Result of settling an in-flight sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompleteOutcome {
	/// `local` was reset to `server_truth` after a failure.
	pub reverted: bool,
	/// Edits made during the flight still differ from the confirmed map.
	pub needs_sync: bool,
}

/// Counters describing sync activity for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SyncStats {
	pub syncs_sent: u64,
	pub syncs_failed: u64,
	pub skipped_no_change: u64,
	pub deferred_updates: u64,
}

/// Read-only view published to subscribers after every state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightSnapshot {
	pub item: LineItemId,
	pub total: Amount,
	pub local: WeightMap,
	pub pending_sync: Option<WeightMap>,
	pub server_truth: WeightMap,
	pub phase: SyncPhase,
	pub finalized: bool,
	pub has_deferred_update: bool,
	pub stats: SyncStats,
}

impl WeightSnapshot {
	/// The map shares are derived from: server truth once finalized.
	pub fn effective(&self) -> &WeightMap {
		if self.finalized { &self.server_truth } else { &self.local }
	}

	pub fn share(&self, id: &ParticipantId) -> f64 {
		compute_share(self.effective(), id, self.total)
	}
}

/// Authority update recorded while it could not be applied.
#[derive(Debug, Clone)]
struct DeferredUpdate {
	weights: WeightMap,
	/// Received after the current request was sent, so it may already
	/// reflect that write. Updates received earlier are superseded by a
	/// successful write, since each write replaces the whole membership.
	during_flight: bool,
}

/// Per-item weight sync state.
#[derive(Debug)]
pub struct WeightSyncState {
	item: LineItemId,
	total: Amount,
	local: WeightMap,
	pending_sync: Option<WeightMap>,
	server_truth: WeightMap,
	deferred: Option<DeferredUpdate>,
	roster: Option<Roster>,
	finalized: bool,
	phase: SyncPhase,
	stats: SyncStats,
}

impl WeightSyncState {
	/// Seeds an idle state from the item's current participants.
	pub fn new(item: &LineItem) -> Result<Self, cashus_primitives::AmountError> {
		let weights = item.weights();
		Ok(Self {
			item: item.id.clone(),
			total: item.total()?,
			local: weights.clone(),
			pending_sync: None,
			server_truth: weights,
			deferred: None,
			roster: None,
			finalized: false,
			phase: SyncPhase::Idle,
			stats: SyncStats::default(),
		})
	}

	pub fn item(&self) -> &LineItemId {
		&self.item
	}

	pub fn total(&self) -> Amount {
		self.total
	}

	pub fn local(&self) -> &WeightMap {
		&self.local
	}

	pub fn pending_sync(&self) -> Option<&WeightMap> {
		self.pending_sync.as_ref()
	}

	pub fn server_truth(&self) -> &WeightMap {
		&self.server_truth
	}

	pub fn phase(&self) -> SyncPhase {
		self.phase
	}

	pub fn roster(&self) -> Option<&Roster> {
		self.roster.as_ref()
	}

	pub fn is_finalized(&self) -> bool {
		self.finalized
	}

	pub fn stats(&self) -> SyncStats {
		self.stats
	}

	/// True when `local` holds edits the server has not confirmed.
	pub fn is_diverged(&self) -> bool {
		self.local != self.server_truth
	}

	pub fn is_in_flight(&self) -> bool {
		self.phase == SyncPhase::Syncing
	}

	fn is_eligible(&self, id: &ParticipantId) -> bool {
		self.roster.as_ref().is_none_or(|r| r.contains(id))
	}

	fn mark_edited(&mut self) {
		if self.phase == SyncPhase::Idle {
			self.phase = SyncPhase::Editing;
		}
	}

	/// Selects or deselects `id`.
	///
	/// Returns false when the edit was ignored (finalized item or ineligible
	/// participant); true means the caller should arm the debounce.
	pub fn toggle(&mut self, id: &ParticipantId) -> bool {
		if self.finalized {
			return false;
		}
		if !self.local.contains(id) && !self.is_eligible(id) {
			debug!(item = %self.item, participant = %id, "split.state.toggle_ineligible");
			return false;
		}
		let mut next = self.local.clone();
		next.toggle(id);
		self.local = next;
		self.mark_edited();
		true
	}

	/// Offsets the weight of a selected participant, flooring at 1.
	///
	/// Returns false when ignored (finalized item or unselected participant).
	pub fn adjust_weight(&mut self, id: &ParticipantId, delta: i64) -> bool {
		if self.finalized || !self.local.contains(id) {
			return false;
		}
		let mut next = self.local.clone();
		next.adjust(id, delta);
		self.local = next;
		self.mark_edited();
		true
	}

	/// Proportional share of the item total for `id`.
	pub fn compute_share(&self, id: &ParticipantId) -> f64 {
		compute_share(self.effective(), id, self.total)
	}

	/// Exact minor-unit split of the item total.
	pub fn allocate_minor_units(&self) -> Vec<(ParticipantId, i64)> {
		allocate_minor_units(self.effective(), self.total)
	}

	fn effective(&self) -> &WeightMap {
		if self.finalized { &self.server_truth } else { &self.local }
	}

	fn filter_roster(&self, mut weights: WeightMap) -> WeightMap {
		if let Some(roster) = &self.roster {
			weights.retain(|id| roster.contains(id));
		}
		weights
	}

	/// Feeds a fresh participant list from the authoritative source.
	pub fn reconcile_from_authority(&mut self, entries: &[AuthorityEntry]) -> ReconcileOutcome {
		let incoming = self.filter_roster(AuthorityEntry::to_weight_map(entries));

		if self.is_in_flight() || self.is_diverged() {
			debug!(
				item = %self.item,
				incoming = %incoming,
				in_flight = self.is_in_flight(),
				"split.state.reconcile_deferred"
			);
			self.deferred = Some(DeferredUpdate {
				weights: incoming,
				during_flight: self.is_in_flight(),
			});
			self.stats.deferred_updates += 1;
			return ReconcileOutcome::Deferred;
		}

		self.deferred = None;
		self.adopt(incoming)
	}

	fn adopt(&mut self, incoming: WeightMap) -> ReconcileOutcome {
		if incoming == self.local && incoming == self.server_truth {
			return ReconcileOutcome::Unchanged;
		}
		debug!(item = %self.item, weights = %incoming, "split.state.reconcile_applied");
		self.server_truth = incoming.clone();
		self.local = incoming;
		ReconcileOutcome::Applied
	}

	/// Applies a recorded authority update once nothing blocks it.
	fn settle_deferred(&mut self) -> bool {
		if self.is_in_flight() || self.is_diverged() {
			return false;
		}
		match self.deferred.take() {
			Some(update) => self.adopt(update.weights) == ReconcileOutcome::Applied,
			None => false,
		}
	}

	/// Takes the payload for a sync call and transitions to in-flight.
	///
	/// Returns `None` when a sync is already in flight, the item is
	/// finalized, or `local` already equals `server_truth` (no call needed).
	pub fn take_for_send(&mut self) -> Option<WeightMap> {
		if self.is_in_flight() || self.finalized {
			return None;
		}
		if !self.is_diverged() {
			if self.phase == SyncPhase::Editing {
				self.stats.skipped_no_change += 1;
			}
			self.phase = SyncPhase::Idle;
			self.settle_deferred();
			return None;
		}

		let payload = self.local.clone();
		self.pending_sync = Some(payload.clone());
		self.phase = SyncPhase::Syncing;
		Some(payload)
	}

	/// Settles the in-flight sync.
	///
	/// On success the sent map becomes server truth. On failure `local`
	/// reverts to server truth, discarding edits made since.
	pub fn mark_complete(&mut self, result: Result<(), &SyncError>) -> CompleteOutcome {
		let Some(sent) = self.pending_sync.take() else {
			debug!(item = %self.item, "split.state.complete_without_flight");
			return CompleteOutcome::default();
		};
		self.phase = SyncPhase::Idle;

		let reverted = match result {
			Ok(()) => {
				self.stats.syncs_sent += 1;
				self.server_truth = sent;
				if self.deferred.as_ref().is_some_and(|d| !d.during_flight) {
					debug!(item = %self.item, "split.state.deferred_superseded");
					self.deferred = None;
				}
				false
			}
			Err(_) => {
				self.stats.syncs_failed += 1;
				self.revert_local();
				true
			}
		};

		if self.finalized {
			self.revert_local();
		}

		if self.is_diverged() && !self.finalized {
			self.phase = SyncPhase::Editing;
		} else {
			self.settle_deferred();
		}

		CompleteOutcome {
			reverted,
			needs_sync: self.phase == SyncPhase::Editing,
		}
	}

	/// Replaces the eligible roster, dropping ineligible selections from
	/// `local` immediately.
	///
	/// Returns true when `local` now differs from `server_truth` and a sync
	/// should be scheduled.
	pub fn set_roster(&mut self, roster: Roster) -> bool {
		let dropped = self.local.retain(|id| roster.contains(id));
		if let Some(deferred) = self.deferred.as_mut() {
			deferred.weights.retain(|id| roster.contains(id));
		}
		self.roster = Some(roster);

		if dropped.is_empty() {
			return false;
		}
		debug!(item = %self.item, dropped = ?dropped, "split.state.stale_roster_entries");
		if self.finalized || !self.is_diverged() {
			return false;
		}
		self.mark_edited();
		true
	}

	/// Resets `local` to server truth without participants the roster has
	/// since dropped.
	fn revert_local(&mut self) {
		let mut local = self.server_truth.clone();
		if let Some(roster) = &self.roster {
			local.retain(|id| roster.contains(id));
		}
		self.local = local;
	}

	/// Locks or unlocks the item for editing.
	///
	/// Finalizing reverts unsynced local edits to server truth. Returns true
	/// when unlocking leaves a roster cleanup that still has to be synced.
	pub fn set_finalized(&mut self, finalized: bool) -> bool {
		self.finalized = finalized;
		if self.is_in_flight() {
			return false;
		}
		if finalized {
			self.revert_local();
			self.phase = SyncPhase::Idle;
			self.settle_deferred();
			return false;
		}
		if self.is_diverged() {
			self.mark_edited();
			return true;
		}
		false
	}

	pub fn snapshot(&self) -> WeightSnapshot {
		WeightSnapshot {
			item: self.item.clone(),
			total: self.total,
			local: self.local.clone(),
			pending_sync: self.pending_sync.clone(),
			server_truth: self.server_truth.clone(),
			phase: self.phase,
			finalized: self.finalized,
			has_deferred_update: self.deferred.is_some(),
			stats: self.stats,
		}
	}
}
