use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::spawn_named;
use crate::token::GenerationToken;

/// Handle to one armed debounce timer.
///
/// Cancelling before the delay elapses drops the scheduled future without
/// polling it. Once the timer has fired, the future runs to completion;
/// cancellation no longer affects it.
#[derive(Debug)]
pub struct ScheduledTask {
	token: GenerationToken,
	fired: Arc<AtomicBool>,
	handle: JoinHandle<()>,
}

impl ScheduledTask {
	/// Cancels the timer if it has not fired yet.
	pub fn cancel(&self) {
		self.token.cancel();
	}

	/// True while the delay is still running.
	pub fn is_pending(&self) -> bool {
		!self.fired.load(Ordering::Acquire) && !self.token.is_cancelled() && !self.handle.is_finished()
	}

	/// Generation of the owner that armed this timer.
	pub fn generation(&self) -> u64 {
		self.token.generation()
	}
}

/// Trailing-edge debounce timer.
///
/// Every [`arm`](Self::arm) cancels the previously armed task, so at most
/// one timer is outstanding per instance and only the last burst member
/// runs.
#[derive(Debug)]
pub struct DebounceTimer {
	delay: Duration,
	slot: Mutex<Option<ScheduledTask>>,
}

impl DebounceTimer {
	pub fn new(delay: Duration) -> Self {
		Self { delay, slot: Mutex::new(None) }
	}

	pub fn delay(&self) -> Duration {
		self.delay
	}

	/// Re-arms the timer to run `fut` after the delay.
	///
	/// The timer is scoped to `owner`: cancelling the owner generation
	/// cancels the timer too.
	pub fn arm<F>(&self, owner: &GenerationToken, fut: F)
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let token = owner.child();
		let fired = Arc::new(AtomicBool::new(false));
		let delay = self.delay;

		let task_token = token.clone();
		let task_fired = Arc::clone(&fired);
		let handle = spawn_named("debounce", async move {
			tokio::select! {
				biased;
				_ = task_token.cancelled() => {
					tracing::trace!(generation = task_token.generation(), "worker.debounce.cancelled");
					return;
				}
				_ = tokio::time::sleep(delay) => {}
			}
			task_fired.store(true, Ordering::Release);
			tracing::trace!(generation = task_token.generation(), "worker.debounce.fired");
			fut.await;
		});

		let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(previous) = slot.replace(ScheduledTask { token, fired, handle }) {
			if previous.is_pending() {
				tracing::trace!(generation = previous.generation(), "worker.debounce.rearmed");
			}
			previous.cancel();
		}
	}

	/// Cancels the outstanding timer, if any.
	pub fn cancel(&self) {
		let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(task) = slot.as_ref() {
			task.cancel();
		}
	}

	/// True while a timer is armed and has not fired.
	pub fn is_pending(&self) -> bool {
		let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
		slot.as_ref().is_some_and(ScheduledTask::is_pending)
	}
}

impl Drop for DebounceTimer {
	fn drop(&mut self) {
		self.cancel();
	}
}
