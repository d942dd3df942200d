use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio_util::sync::CancellationToken;

/// Hands out owner lifecycles, numbered from 1.
///
/// Clones share the counter, so a store and its rebinds never reuse a
/// number.
#[derive(Debug, Default, Clone)]
pub struct GenerationClock {
	issued: Arc<AtomicU64>,
}

impl GenerationClock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Starts a new lifecycle. Earlier tokens are unaffected; cancel them
	/// explicitly when replacing an owner.
	pub fn issue(&self) -> GenerationToken {
		let generation = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
		GenerationToken {
			generation,
			scope: CancellationToken::new(),
		}
	}

	/// Most recently issued generation, or 0 before the first `issue`.
	pub fn latest(&self) -> u64 {
		self.issued.load(Ordering::Acquire)
	}
}

/// One owner lifecycle.
///
/// Timers and in-flight work hold a [`child`](Self::child) and check
/// [`is_current`](Self::is_current) before touching owner state.
#[derive(Debug, Clone)]
pub struct GenerationToken {
	generation: u64,
	scope: CancellationToken,
}

impl GenerationToken {
	pub const fn generation(&self) -> u64 {
		self.generation
	}

	pub fn is_cancelled(&self) -> bool {
		self.scope.is_cancelled()
	}

	/// True if `generation` names this lifecycle and it is still live.
	pub fn is_current(&self, generation: u64) -> bool {
		!self.scope.is_cancelled() && self.generation == generation
	}

	/// Ends the lifecycle along with every child.
	pub fn cancel(&self) {
		self.scope.cancel();
	}

	pub async fn cancelled(&self) {
		self.scope.cancelled().await
	}

	/// Token for work scoped to this lifecycle that can also be cancelled
	/// on its own.
	pub fn child(&self) -> Self {
		Self {
			generation: self.generation,
			scope: self.scope.child_token(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_issued_generations_are_sequential() {
		let clock = GenerationClock::new();
		assert_eq!(clock.latest(), 0);
		assert_eq!(clock.issue().generation(), 1);
		assert_eq!(clock.clone().issue().generation(), 2);
		assert_eq!(clock.latest(), 2);
	}

	#[test]
	fn test_cancelling_owner_cancels_children_only_downward() {
		let owner = GenerationClock::new().issue();
		let child = owner.child();
		assert!(child.is_current(owner.generation()));

		child.cancel();
		assert!(!owner.is_cancelled());

		let child = owner.child();
		owner.cancel();
		assert!(child.is_cancelled());
		assert!(!child.is_current(owner.generation()));
	}

	#[test]
	fn test_stale_generation_is_not_current() {
		let clock = GenerationClock::new();
		let first = clock.issue();
		let second = clock.issue();
		assert!(!second.is_current(first.generation()));
		assert!(second.is_current(second.generation()));
	}
}
