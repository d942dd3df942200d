//! Sync timing configuration.
//!
//! Read from TOML with millisecond fields:
//!
//! ```toml
//! debounce_ms = 500
//! sync_timeout_ms = 10000
//! ```
//!
//! Missing fields fall back to [`DEFAULT_DEBOUNCE`] and
//! [`DEFAULT_SYNC_TIMEOUT`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Trailing debounce applied to participant edits before syncing.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Upper bound on one sync round-trip before it counts as failed.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or field types.
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// A field holds a value outside its accepted range.
	#[error("invalid value for {field}: {reason}")]
	Invalid { field: &'static str, reason: &'static str },
}

/// Timing knobs for a [`ParticipantWeightStore`](crate::ParticipantWeightStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitConfig {
	pub debounce: Duration,
	pub sync_timeout: Duration,
}

impl Default for SplitConfig {
	fn default() -> Self {
		Self {
			debounce: DEFAULT_DEBOUNCE,
			sync_timeout: DEFAULT_SYNC_TIMEOUT,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSplitConfig {
	debounce_ms: u64,
	sync_timeout_ms: u64,
}

impl Default for RawSplitConfig {
	fn default() -> Self {
		Self {
			debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
			sync_timeout_ms: DEFAULT_SYNC_TIMEOUT.as_millis() as u64,
		}
	}
}

impl TryFrom<RawSplitConfig> for SplitConfig {
	type Error = ConfigError;

	fn try_from(raw: RawSplitConfig) -> Result<Self, Self::Error> {
		if raw.sync_timeout_ms == 0 {
			return Err(ConfigError::Invalid {
				field: "sync_timeout_ms",
				reason: "must be greater than zero",
			});
		}
		Ok(Self {
			debounce: Duration::from_millis(raw.debounce_ms),
			sync_timeout: Duration::from_millis(raw.sync_timeout_ms),
		})
	}
}

impl<'de> Deserialize<'de> for SplitConfig {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let raw = RawSplitConfig::deserialize(deserializer)?;
		Self::try_from(raw).map_err(serde::de::Error::custom)
	}
}

impl SplitConfig {
	/// Parses configuration from TOML text.
	pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
		let raw: RawSplitConfig = toml::from_str(input)?;
		Self::try_from(raw)
	}

	/// Loads configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		Self::from_toml_str(&text)
	}
}
