use thiserror::Error;

/// Failures that can occur while fetching resources or touching the cache.
///
/// None of these are fatal. Callers log them and keep showing whatever data
/// they already have.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
  #[error("Network error: {0}")]
  Network(String),

  #[error("Unexpected status {status} from {url}")]
  Status { status: u16, url: String },

  #[error("Invalid response body: {0}")]
  Decode(String),

  #[error("Failed to read cache entry {key}: {reason}")]
  CacheRead { key: String, reason: String },

  #[error("Failed to write cache entry {key}: {reason}")]
  CacheWrite { key: String, reason: String },
}

impl CacheError {
  /// True for failures on the network side of a refresh (transport, status, body).
  pub fn is_network(&self) -> bool {
    matches!(
      self,
      CacheError::Network(_) | CacheError::Status { .. } | CacheError::Decode(_)
    )
  }

  pub(crate) fn read(key: &str, reason: impl ToString) -> Self {
    CacheError::CacheRead {
      key: key.to_string(),
      reason: reason.to_string(),
    }
  }

  pub(crate) fn write(key: &str, reason: impl ToString) -> Self {
    CacheError::CacheWrite {
      key: key.to_string(),
      reason: reason.to_string(),
    }
  }
}

impl From<reqwest::Error> for CacheError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      CacheError::Decode(err.to_string())
    } else {
      CacheError::Network(err.to_string())
    }
  }
}

impl From<serde_json::Error> for CacheError {
  fn from(err: serde_json::Error) -> Self {
    CacheError::Decode(err.to_string())
  }
}
