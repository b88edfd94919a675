//! Error taxonomy for the tracker core.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T, E = TrackerError> = std::result::Result<T, E>;

/// Errors surfaced by the tracker core.
///
/// Cache *corruption* never appears here: a mirror that fails to deserialize
/// is treated as absent and triggers a forced resync instead.
#[derive(Debug, Error)]
pub enum TrackerError {
  /// A required input to a mutation was empty. Raised before any I/O.
  #[error("missing required field: {field}")]
  MissingField { field: &'static str },

  /// A delete matched no remote records. No state was changed.
  #[error("no records found for char '{char_name}', item '{item}', status '{status}'")]
  NotFound {
    char_name: String,
    item: String,
    status: String,
  },

  /// The remote document store failed. A failed fetch aborts the current
  /// sync pass and leaves the prior cache intact.
  #[error("remote store error: {0}")]
  Remote(String),

  /// The local key-value store failed on read or write.
  #[error("cache store error: {0}")]
  Cache(String),

  /// Configuration could not be located or parsed.
  #[error("config error: {0}")]
  Config(String),
}

impl From<reqwest::Error> for TrackerError {
  fn from(e: reqwest::Error) -> Self {
    TrackerError::Remote(e.to_string())
  }
}
