//! Error types for weight synchronization.

use std::time::Duration;

use cashus_primitives::AmountError;
use thiserror::Error;

use crate::config::ConfigError;

/// Failure of one remote sync call.
///
/// Every variant is recovered the same way: local edits revert to the last
/// known server state and the user is notified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
	/// The server refused the membership set.
	#[error("sync rejected: {0}")]
	Rejected(String),
	/// The request never produced a server answer.
	#[error("network error: {0}")]
	Network(String),
	/// The request did not settle within the configured timeout.
	#[error("sync timed out after {0:?}")]
	Timeout(Duration),
}

/// Errors surfaced when constructing or rebinding a store.
#[derive(Debug, Error)]
pub enum Error {
	/// The line item amount could not be scaled by its quantity.
	#[error("invalid line item amount: {0}")]
	Amount(#[from] AmountError),
	/// Configuration failed to load.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// A convenient type alias for `Result` with `E` = [`enum@Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
