//! Errors raised by secret backends.

use thiserror::Error;

/// Failure kinds a [`SecretBackend`](super::SecretBackend) can report.
///
/// A missing entry is not an error: `get` answers `Ok(None)` for it. On the
/// read path every kind below is absorbed by the storage manager and treated
/// as "nothing stored"; on the write path they are surfaced to the caller,
/// which logs them without failing the sign-in.
#[derive(Debug, Error)]
pub enum BackendError {
  /// Native output could not be interpreted.
  #[error("Malformed credential data: {reason}")]
  Malformed { reason: String },

  /// The native tool is missing, or it exited with a failure.
  #[error("Credential store unavailable ({tool}): {reason}")]
  Unavailable { tool: String, reason: String },

  /// The native tool did not finish in time.
  #[error("{tool} did not finish within {timeout_secs}s")]
  Timeout { tool: String, timeout_secs: u64 },

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl BackendError {
  pub(crate) fn unavailable(tool: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::Unavailable {
      tool: tool.into(),
      reason: reason.into(),
    }
  }

  pub(crate) fn malformed(reason: impl Into<String>) -> Self {
    Self::Malformed { reason: reason.into() }
  }
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;
