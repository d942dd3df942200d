use std::future::Future;

use tokio::task::JoinHandle;
use tracing::Instrument;

/// Spawns `fut` on the current Tokio runtime inside a `worker.task` span
/// named `name`.
///
/// # Panics
///
/// Panics when called outside a Tokio runtime.
pub fn spawn_named<F>(name: &'static str, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	let span = tracing::trace_span!("worker.task", task = name);
	tokio::spawn(fut.instrument(span))
}
