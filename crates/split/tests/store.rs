//! End-to-end behavior of the participant weight store against a recording
//! gateway, on a paused clock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cashus_primitives::{AuthorityEntry, LineItem, LineItemId, ParticipantId, ParticipantWeight, Weight, WeightMap};
use cashus_split::{Notice, ParticipantWeightStore, ReconcileOutcome, SplitConfig, SyncError, SyncGateway, SyncPhase};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;
use tokio::time::sleep;

#[derive(Default)]
struct RecordingGateway {
	payloads: Mutex<Vec<WeightMap>>,
	reject: Mutex<bool>,
}

impl RecordingGateway {
	fn payloads(&self) -> Vec<WeightMap> {
		self.payloads.lock().clone()
	}

	fn reject_all(&self, reject: bool) {
		*self.reject.lock() = reject;
	}
}

#[async_trait]
impl SyncGateway for RecordingGateway {
	async fn sync_participants(&self, _item: &LineItemId, weights: &[ParticipantWeight]) -> Result<(), SyncError> {
		self.payloads
			.lock()
			.push(weights.iter().map(|w| (w.participant_id.clone(), w.weight)).collect());
		if *self.reject.lock() {
			return Err(SyncError::Rejected("item is locked".into()));
		}
		Ok(())
	}
}

struct Harness {
	gateway: Arc<RecordingGateway>,
	store: ParticipantWeightStore,
	notices: mpsc::UnboundedReceiver<Notice>,
}

impl Harness {
	fn new(amount: &str, quantity: u32, list: &[(&str, i64)]) -> Self {
		let mut item = LineItem::new("dinner-main", amount, quantity).unwrap();
		for (id, weight) in list {
			item = item.with_participant(*id, *weight);
		}
		let gateway = Arc::new(RecordingGateway::default());
		let (tx, notices) = mpsc::unbounded_channel();
		let store = ParticipantWeightStore::new(&item, gateway.clone(), Arc::new(tx), SplitConfig::default()).unwrap();
		Self { gateway, store, notices }
	}

	async fn settle(&self) {
		sleep(Duration::from_secs(2)).await;
	}
}

fn pid(id: &str) -> ParticipantId {
	ParticipantId::new(id)
}

fn weights(entries: &[(&str, u32)]) -> WeightMap {
	entries
		.iter()
		.map(|(id, w)| (pid(id), Weight::new(*w).unwrap()))
		.collect()
}

fn authority(entries: &[(&str, i64)]) -> Vec<AuthorityEntry> {
	entries.iter().map(|(id, w)| AuthorityEntry::new(*id, Some(*w))).collect()
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_weight_never_drops_below_one() {
	let h = Harness::new("30.00", 1, &[("ana", 2), ("ben", 1)]);
	for delta in [-1, -1, -3, 5, -100, 0, -1] {
		h.store.adjust_weight(&pid("ana"), delta);
		assert!(h.store.snapshot().local.get(&pid("ana")).unwrap().get() >= 1);
	}
	h.settle().await;
	assert_eq!(h.store.snapshot().server_truth.get(&pid("ana")), Some(Weight::ONE));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_toggling_off_removes_participant_and_share() {
	let h = Harness::new("30.00", 1, &[("ana", 1), ("ben", 1)]);
	h.store.toggle(&pid("ana"));

	let snapshot = h.store.snapshot();
	assert!(!snapshot.local.contains(&pid("ana")));
	assert_eq!(h.store.compute_share(&pid("ana")), 0.0);
	assert!((h.store.compute_share(&pid("ben")) - 30.0).abs() < 1e-9);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_shares_sum_to_item_total() {
	let h = Harness::new("17.35", 3, &[("ana", 1), ("ben", 2), ("cy", 4)]);
	let ids = [pid("ana"), pid("ben"), pid("cy")];
	let sum: f64 = ids.iter().map(|id| h.store.compute_share(id)).sum();
	assert!((sum - 52.05).abs() < 1e-9);

	let exact: i64 = h.store.allocate_minor_units().iter().map(|(_, units)| units).sum();
	assert_eq!(exact, 5205);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_split_scenario_one_to_three() {
	let h = Harness::new("100.00", 2, &[("a", 1), ("b", 3)]);
	assert!((h.store.compute_share(&pid("a")) - 50.0).abs() < 1e-9);
	assert!((h.store.compute_share(&pid("b")) - 150.0).abs() < 1e-9);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_burst_of_toggles_sends_one_final_payload() {
	let h = Harness::new("40.00", 1, &[("a", 1)]);
	for id in ["b", "c", "b", "d", "e"] {
		h.store.toggle(&pid(id));
		sleep(Duration::from_millis(50)).await;
	}
	let final_local = h.store.snapshot().local;
	assert_eq!(final_local, weights(&[("a", 1), ("c", 1), ("d", 1), ("e", 1)]));

	h.settle().await;
	assert_eq!(h.gateway.payloads(), vec![final_local]);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_toggle_and_untoggle_within_window_sends_nothing() {
	let h = Harness::new("40.00", 1, &[("a", 1)]);
	h.store.toggle(&pid("b"));
	h.store.toggle(&pid("b"));
	h.settle().await;

	assert!(h.gateway.payloads().is_empty());
	let snapshot = h.store.snapshot();
	assert_eq!(snapshot.phase, SyncPhase::Idle);
	assert_eq!(snapshot.stats.skipped_no_change, 1);
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_failed_sync_reverts_to_server_truth() {
	let mut h = Harness::new("10.00", 1, &[("a", 1), ("b", 1)]);
	h.gateway.reject_all(true);

	h.store.adjust_weight(&pid("a"), 1);
	assert_eq!(h.store.snapshot().local, weights(&[("a", 2), ("b", 1)]));
	h.settle().await;

	assert_eq!(h.store.snapshot().local, weights(&[("a", 1), ("b", 1)]));
	let notice = h.notices.try_recv().unwrap();
	assert_eq!(notice.item, Some(LineItemId::new("dinner-main")));
	assert!(notice.message.contains("item is locked"));

	h.gateway.reject_all(false);
	h.store.adjust_weight(&pid("b"), 2);
	h.settle().await;
	assert_eq!(h.store.snapshot().server_truth, weights(&[("a", 1), ("b", 3)]));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_reconciliation_waits_for_pending_edit() {
	let h = Harness::new("10.00", 1, &[("A", 1)]);
	h.store.adjust_weight(&pid("A"), 1);

	let outcome = h.store.reconcile_from_authority(&authority(&[("A", 1), ("B", 1)]));
	assert_eq!(outcome, ReconcileOutcome::Deferred);
	assert_eq!(h.store.snapshot().local, weights(&[("A", 2)]));
	assert!(h.store.snapshot().has_deferred_update);

	h.settle().await;
	assert_eq!(h.store.snapshot().local, weights(&[("A", 2)]));

	let outcome = h.store.reconcile_from_authority(&authority(&[("A", 2), ("B", 1)]));
	assert_eq!(outcome, ReconcileOutcome::Applied);
	assert_eq!(h.store.snapshot().local, weights(&[("A", 2), ("B", 1)]));
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_reconciliation_applies_when_idle() {
	let h = Harness::new("10.00", 1, &[("A", 1)]);
	let mut updates = h.store.subscribe();

	let outcome = h.store.reconcile_from_authority(&authority(&[("A", 1), ("B", 3)]));
	assert_eq!(outcome, ReconcileOutcome::Applied);
	assert_eq!(updates.borrow_and_update().local, weights(&[("A", 1), ("B", 3)]));

	h.settle().await;
	assert!(h.gateway.payloads().is_empty(), "adopting authority is not an edit");
}
