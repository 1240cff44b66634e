//! Error types for configuration loading and writes.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when loading or changing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error parsing TOML syntax or shape.
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

	/// Opacity must lie in `[0, 1]`.
	#[error("opacity out of range: {0} (expected 0.0..=1.0)")]
	OpacityOutOfRange(f32),

	/// A key outside the `focusFog` namespace or not known to it.
	#[error("unknown setting: {0}")]
	UnknownKey(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
