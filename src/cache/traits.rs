//! Core types shared by the caching system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A stored value plus the timestamp and lifetime it was written with.
///
/// `ttl_ms == 0` means the entry never goes stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
  pub stored_at: DateTime<Utc>,
  pub ttl_ms: u64,
  pub value: T,
}

/// Callback invoked once when a background refresh lands.
pub type UpdateCallback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Per-call options for a cached fetch.
pub struct FetchOptions<T> {
  /// Serve any existing entry immediately and refresh it in the background
  pub swr: bool,
  /// Receives the refreshed value after a successful background refresh
  pub on_update: Option<UpdateCallback<T>>,
}

impl<T> FetchOptions<T> {
  /// Plain cache-aside read-through.
  pub fn read_through() -> Self {
    Self {
      swr: false,
      on_update: None,
    }
  }

  /// Stale-while-revalidate.
  pub fn swr() -> Self {
    Self {
      swr: true,
      on_update: None,
    }
  }

  pub fn on_update(mut self, callback: impl Fn(T) + Send + Sync + 'static) -> Self {
    self.on_update = Some(Arc::new(callback));
    self
  }
}

impl<T> Default for FetchOptions<T> {
  fn default() -> Self {
    Self::read_through()
  }
}

impl<T> Clone for FetchOptions<T> {
  fn clone(&self) -> Self {
    Self {
      swr: self.swr,
      on_update: self.on_update.clone(),
    }
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from cached data.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>, is_stale: bool) -> Self {
    Self {
      data,
      source: if is_stale {
        CacheSource::CacheStale
      } else {
        CacheSource::CacheFresh
      },
      cached_at: Some(cached_at),
    }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Data from cache, still considered fresh
  CacheFresh,
  /// Data from cache past its TTL; a background refresh may be in flight
  CacheStale,
}
