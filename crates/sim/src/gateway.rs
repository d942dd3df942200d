//! In-memory stand-in for the participant sync endpoint.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use cashus_primitives::{LineItemId, ParticipantWeight, WeightMap};
use cashus_split::{SyncError, SyncGateway};
use parking_lot::Mutex;
use tracing::info;

/// Stores the last accepted membership per item; failures are scripted.
#[derive(Debug, Default)]
pub struct MemoryGateway {
	latency: Duration,
	items: Mutex<HashMap<LineItemId, WeightMap>>,
	failures: Mutex<VecDeque<String>>,
	requests: Mutex<u64>,
}

impl MemoryGateway {
	pub fn new(latency: Duration) -> Self {
		Self { latency, ..Self::default() }
	}

	/// Rejects the next request with `reason`.
	pub fn fail_next(&self, reason: String) {
		self.failures.lock().push_back(reason);
	}

	pub fn stored(&self, item: &LineItemId) -> Option<WeightMap> {
		self.items.lock().get(item).cloned()
	}

	pub fn request_count(&self) -> u64 {
		*self.requests.lock()
	}
}

#[async_trait]
impl SyncGateway for MemoryGateway {
	async fn sync_participants(&self, item: &LineItemId, weights: &[ParticipantWeight]) -> Result<(), SyncError> {
		*self.requests.lock() += 1;
		if !self.latency.is_zero() {
			tokio::time::sleep(self.latency).await;
		}

		let failure = self.failures.lock().pop_front();
		if let Some(reason) = failure {
			info!(item = %item, reason = %reason, "sim.gateway.rejected");
			return Err(SyncError::Rejected(reason));
		}

		let membership: WeightMap = weights.iter().map(|w| (w.participant_id.clone(), w.weight)).collect();
		info!(item = %item, weights = %membership, "sim.gateway.stored");
		self.items.lock().insert(item.clone(), membership);
		Ok(())
	}
}
