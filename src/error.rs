//! Error taxonomy for the data layer.
//!
//! Foreground fetches surface a [`DashError`]. [`StoreError`] is produced by the
//! persistent store but is absorbed at the TTL cache boundary and turned into a miss.

use thiserror::Error;

pub type DashResult<T> = std::result::Result<T, DashError>;

#[derive(Debug, Clone, Error)]
pub enum DashError {
  /// Network or HTTP level failure talking to the remote API.
  #[error("request to GitHub failed: {0}")]
  Transport(String),

  /// The remote API answered, but reported an application-level failure.
  #[error("GitHub rejected the query: {0}")]
  RemoteQuery(String),

  /// The response did not have the shape we expected.
  #[error("could not decode GitHub response: {0}")]
  Decode(String),

  #[error(transparent)]
  Store(#[from] StoreError),
}

impl From<reqwest::Error> for DashError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      DashError::Decode(e.to_string())
    } else {
      DashError::Transport(e.to_string())
    }
  }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
  #[error("cache storage unavailable: {0}")]
  Unavailable(String),

  #[error("failed to read cache key {key}: {message}")]
  Read { key: String, message: String },

  #[error("failed to write cache key {key}: {message}")]
  Write { key: String, message: String },

  #[error("corrupt cache entry {key}: {message}")]
  Corrupt { key: String, message: String },
}
