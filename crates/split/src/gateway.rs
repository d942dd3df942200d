//! Seams to the outside world: the remote sync endpoint and the user-facing
//! notification channel.

use async_trait::async_trait;
use cashus_primitives::{LineItemId, ParticipantWeight};
use tokio::sync::mpsc;

use crate::error::SyncError;

/// Remote endpoint persisting the participant membership of a line item.
///
/// `weights` is the complete desired membership; participants absent from
/// it are removed server-side. Implementations must be idempotent: the same
/// payload may be sent more than once.
#[async_trait]
pub trait SyncGateway: Send + Sync + 'static {
	async fn sync_participants(&self, item: &LineItemId, weights: &[ParticipantWeight]) -> Result<(), SyncError>;
}

/// Severity level of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Level {
	/// Informational message (default).
	#[default]
	Info,
	/// Warning message.
	Warn,
	/// Error message.
	Error,
}

/// Short human-readable message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
	pub level: Level,
	pub item: Option<LineItemId>,
	pub message: String,
}

impl Notice {
	/// Notice raised when a participant update could not be saved.
	pub fn sync_failed(item: &LineItemId, err: &SyncError) -> Self {
		let message = match err {
			SyncError::Timeout(_) => "Saving participants timed out; your changes were reverted".to_string(),
			SyncError::Network(_) => "Could not reach the server; your changes were reverted".to_string(),
			SyncError::Rejected(reason) => format!("Failed to update participants: {reason}"),
		};
		Self {
			level: Level::Error,
			item: Some(item.clone()),
			message,
		}
	}
}

/// Delivers notices to the user.
pub trait Notifier: Send + Sync + 'static {
	fn notify(&self, notice: Notice);
}

/// Notifier that only records notices in the trace log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
	fn notify(&self, notice: Notice) {
		match notice.level {
			Level::Error => tracing::error!(item = ?notice.item, message = %notice.message, "split.notice"),
			Level::Warn => tracing::warn!(item = ?notice.item, message = %notice.message, "split.notice"),
			Level::Info => tracing::info!(item = ?notice.item, message = %notice.message, "split.notice"),
		}
	}
}

/// Forwards notices to a UI event loop. Closed receivers are ignored.
impl Notifier for mpsc::UnboundedSender<Notice> {
	fn notify(&self, notice: Notice) {
		if self.send(notice).is_err() {
			tracing::debug!("split.notice.receiver_closed");
		}
	}
}

#[cfg(test)]
mod tests {
	use std::time::Duration;

	use super::*;

	#[test]
	fn test_sync_failure_messages_name_the_cause() {
		let item = LineItemId::new("dinner-main");
		let rejected = Notice::sync_failed(&item, &SyncError::Rejected("item is locked".into()));
		assert_eq!(rejected.level, Level::Error);
		assert_eq!(rejected.item, Some(item.clone()));
		assert_eq!(rejected.message, "Failed to update participants: item is locked");

		let timeout = Notice::sync_failed(&item, &SyncError::Timeout(Duration::from_secs(10)));
		assert!(timeout.message.contains("timed out"));
	}

	#[test]
	fn test_channel_notifier_forwards_and_tolerates_closed_receiver() {
		let (tx, mut rx) = mpsc::unbounded_channel();
		let notice = Notice::sync_failed(&LineItemId::new("x"), &SyncError::Network("reset".into()));
		tx.notify(notice.clone());
		assert_eq!(rx.try_recv().ok(), Some(notice.clone()));

		drop(rx);
		tx.notify(notice.clone());
		TracingNotifier.notify(notice);
	}
}
