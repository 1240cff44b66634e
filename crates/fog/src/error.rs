//! Errors raised by host collaborators.

use focusfog_config::ConfigError;
use thiserror::Error;

/// A failure reported by one of the host services.
///
/// Ordinary outcomes such as "no active document" or "no fold data" are not
/// errors; see [`crate::FogOutcome`].
#[derive(Debug, Error)]
pub enum HostError {
	/// The folding provider failed to answer.
	#[error("folding provider failed: {0}")]
	Folding(String),

	/// The decoration renderer rejected a call.
	#[error("decoration renderer failed: {0}")]
	Renderer(String),

	/// No command is registered under this id.
	#[error("unknown command: {0}")]
	UnknownCommand(String),

	/// A command with the same id is already registered.
	#[error("command already registered: {0}")]
	CommandConflict(String),

	/// The status surface rejected a call.
	#[error("status surface failed: {0}")]
	Status(String),

	/// Reading or writing settings failed.
	#[error(transparent)]
	Config(#[from] ConfigError),
}

/// Result type for host interactions.
pub type Result<T> = std::result::Result<T, HostError>;
