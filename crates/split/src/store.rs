//! Debounced participant weight store for one line item.
//!
//! [`ParticipantWeightStore`] wraps a [`WeightSyncState`] and drives it:
//! - edits mutate `local` synchronously and re-arm a trailing debounce
//! - the debounce fires a single in-flight sync of the full `local` map
//! - completions promote or revert, then re-arm if edits piled up
//! - every change is published on a `watch` channel
//!
//! # Lifecycle
//!
//! Each bound item owns one generation token. Dropping the store,
//! [`shutdown`](ParticipantWeightStore::shutdown), or
//! [`rebind`](ParticipantWeightStore::rebind) cancels the generation: the
//! pending timer is dropped and a late gateway response is discarded.
//!
//! # Error Handling
//!
//! Gateway errors and timeouts never reach callers of the edit methods.
//! They revert `local` to server truth and raise a [`Notice`].

use std::sync::{Arc, Weak};
use std::time::Instant;

use cashus_primitives::{AuthorityEntry, LineItem, ParticipantId, Roster};
use cashus_worker::{DebounceTimer, GenerationClock, GenerationToken};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::config::SplitConfig;
use crate::error::{Result, SyncError};
use crate::gateway::{Notice, Notifier, SyncGateway};
use crate::state::{ReconcileOutcome, WeightSnapshot, WeightSyncState};

struct StoreInner {
	state: Mutex<WeightSyncState>,
	lifecycle: Mutex<GenerationToken>,
	clock: GenerationClock,
	timer: DebounceTimer,
	gateway: Arc<dyn SyncGateway>,
	notifier: Arc<dyn Notifier>,
	config: SplitConfig,
	updates: watch::Sender<WeightSnapshot>,
}

impl StoreInner {
	fn publish(&self) {
		let snapshot = self.state.lock().snapshot();
		self.updates.send_replace(snapshot);
	}

	fn current_token(&self) -> GenerationToken {
		self.lifecycle.lock().clone()
	}

	fn is_current(&self, generation: u64) -> bool {
		self.lifecycle.lock().is_current(generation)
	}

	fn schedule_sync(self: &Arc<Self>) {
		let token = self.current_token();
		if token.is_cancelled() {
			return;
		}
		let weak = Arc::downgrade(self);
		let generation = token.generation();
		trace!(generation, delay_ms = self.timer.delay().as_millis() as u64, "split.store.debounce_armed");
		self.timer.arm(&token, flush(weak, generation));
	}
}

/// Sends the current local map if it diverged, then applies the result.
async fn flush(weak: Weak<StoreInner>, generation: u64) {
	let Some(inner) = weak.upgrade() else {
		return;
	};
	if !inner.is_current(generation) {
		return;
	}

	let taken = {
		let mut state = inner.state.lock();
		state.take_for_send().map(|payload| (state.item().clone(), payload))
	};
	inner.publish();
	let Some((item, payload)) = taken else {
		trace!(generation, "split.sync.nothing_to_send");
		return;
	};

	let gateway = Arc::clone(&inner.gateway);
	let timeout = inner.config.sync_timeout;
	drop(inner);

	debug!(item = %item, weights = %payload, participants = payload.len(), "split.sync.flush_start");
	let start = Instant::now();
	let entries = payload.to_entries();
	let result = match tokio::time::timeout(timeout, gateway.sync_participants(&item, &entries)).await {
		Ok(result) => result,
		Err(_) => Err(SyncError::Timeout(timeout)),
	};
	let latency_ms = start.elapsed().as_millis() as u64;

	let Some(inner) = weak.upgrade() else {
		debug!(item = %item, latency_ms, "split.sync.owner_dropped");
		return;
	};
	if !inner.is_current(generation) {
		debug!(item = %item, latency_ms, "split.sync.stale_completion");
		return;
	}

	let outcome = inner.state.lock().mark_complete(result.as_ref().map(|_| ()));
	match &result {
		Ok(()) => debug!(item = %item, latency_ms, "split.sync.flush_done"),
		Err(err) => {
			warn!(item = %item, latency_ms, error = %err, "split.sync.flush_failed");
			inner.notifier.notify(Notice::sync_failed(&item, err));
		}
	}
	inner.publish();

	if outcome.needs_sync && !inner.timer.is_pending() {
		inner.schedule_sync();
	}
}

/// Optimistic participant weight editor for one line item.
///
/// All edit methods are synchronous and infallible; sync failures surface
/// later through the [`Notifier`]. Must be used from within a Tokio
/// runtime.
pub struct ParticipantWeightStore {
	inner: Arc<StoreInner>,
}

impl std::fmt::Debug for ParticipantWeightStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let state = self.inner.state.lock();
		f.debug_struct("ParticipantWeightStore")
			.field("item", state.item())
			.field("phase", &state.phase())
			.field("local", state.local())
			.finish()
	}
}

impl ParticipantWeightStore {
	/// Creates an idle store seeded from `item`'s participants.
	pub fn new(item: &LineItem, gateway: Arc<dyn SyncGateway>, notifier: Arc<dyn Notifier>, config: SplitConfig) -> Result<Self> {
		let state = WeightSyncState::new(item)?;
		let (updates, _) = watch::channel(state.snapshot());
		let clock = GenerationClock::new();
		let lifecycle = clock.issue();
		debug!(item = %item.id, generation = lifecycle.generation(), weights = %state.local(), "split.store.mount");

		Ok(Self {
			inner: Arc::new(StoreInner {
				state: Mutex::new(state),
				lifecycle: Mutex::new(lifecycle),
				clock,
				timer: DebounceTimer::new(config.debounce),
				gateway,
				notifier,
				config,
				updates,
			}),
		})
	}

	/// Selects or deselects a participant and re-arms the debounce.
	pub fn toggle(&self, id: &ParticipantId) {
		let applied = self.inner.state.lock().toggle(id);
		if !applied {
			return;
		}
		trace!(participant = %id, "split.store.toggle");
		self.inner.publish();
		self.inner.schedule_sync();
	}

	/// Offsets a selected participant's weight (floor 1) and re-arms the debounce.
	pub fn adjust_weight(&self, id: &ParticipantId, delta: i64) {
		let applied = self.inner.state.lock().adjust_weight(id, delta);
		if !applied {
			return;
		}
		trace!(participant = %id, delta, "split.store.adjust_weight");
		self.inner.publish();
		self.inner.schedule_sync();
	}

	/// Proportional share of the item total for `id`; 0 when unselected.
	pub fn compute_share(&self, id: &ParticipantId) -> f64 {
		self.inner.state.lock().compute_share(id)
	}

	/// Exact minor-unit split of the item total.
	pub fn allocate_minor_units(&self) -> Vec<(ParticipantId, i64)> {
		self.inner.state.lock().allocate_minor_units()
	}

	/// Feeds a refreshed participant list from the authoritative source.
	pub fn reconcile_from_authority(&self, entries: &[AuthorityEntry]) -> ReconcileOutcome {
		let outcome = self.inner.state.lock().reconcile_from_authority(entries);
		if outcome != ReconcileOutcome::Unchanged {
			self.inner.publish();
		}
		outcome
	}

	/// Replaces the eligible roster; stale selections are dropped at once.
	pub fn set_roster(&self, roster: Roster) {
		let needs_sync = self.inner.state.lock().set_roster(roster);
		self.inner.publish();
		if needs_sync {
			self.inner.schedule_sync();
		}
	}

	/// Locks or unlocks the item. Finalizing cancels the pending debounce;
	/// unlocking syncs any roster cleanup made while locked.
	pub fn set_finalized(&self, finalized: bool) {
		if finalized {
			self.inner.timer.cancel();
		}
		let needs_sync = self.inner.state.lock().set_finalized(finalized);
		self.inner.publish();
		if needs_sync {
			self.inner.schedule_sync();
		}
	}

	/// Rebinds the store to a different line item.
	///
	/// The previous generation is cancelled; its in-flight result, if any,
	/// is discarded.
	pub fn rebind(&self, item: &LineItem) -> Result<()> {
		let mut fresh = WeightSyncState::new(item)?;
		let mut needs_sync = false;
		let next = self.inner.clock.issue();
		{
			let mut lifecycle = self.inner.lifecycle.lock();
			lifecycle.cancel();
			*lifecycle = next;
		}
		{
			let mut state = self.inner.state.lock();
			debug!(from = %state.item(), to = %item.id, generation = self.inner.clock.latest(), "split.store.rebind");
			if let Some(roster) = state.roster().cloned() {
				needs_sync = fresh.set_roster(roster);
			}
			*state = fresh;
		}
		self.inner.publish();
		if needs_sync {
			self.inner.schedule_sync();
		}
		Ok(())
	}

	/// Cancels the pending debounce and detaches any in-flight sync.
	pub fn shutdown(&self) {
		let lifecycle = self.inner.lifecycle.lock();
		if !lifecycle.is_cancelled() {
			debug!(generation = lifecycle.generation(), "split.store.unmount");
			lifecycle.cancel();
		}
	}

	/// True while a debounce timer is armed and has not fired.
	pub fn is_sync_scheduled(&self) -> bool {
		self.inner.timer.is_pending()
	}

	/// Current state.
	pub fn snapshot(&self) -> WeightSnapshot {
		self.inner.state.lock().snapshot()
	}

	/// Receives a new snapshot after every state change.
	pub fn subscribe(&self) -> watch::Receiver<WeightSnapshot> {
		self.inner.updates.subscribe()
	}
}

impl Drop for ParticipantWeightStore {
	fn drop(&mut self) {
		self.shutdown();
	}
}
