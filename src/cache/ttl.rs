//! Timestamped envelope over a [`KvStore`] with a freshness predicate.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::clock::Clock;
use super::storage::KvStore;
use super::traits::CacheEntry;
use crate::error::StoreError;

/// TTL cache over a shared store.
///
/// Store failures never escape this type: a read that fails (or finds an
/// undecodable entry) is reported as a miss, and a failed write is logged and
/// dropped.
#[derive(Clone)]
pub struct TtlCache {
  store: Arc<dyn KvStore>,
  clock: Arc<dyn Clock>,
}

impl TtlCache {
  pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
    Self { store, clock }
  }

  pub fn now(&self) -> DateTime<Utc> {
    self.clock.now()
  }

  /// Raw entry for `key`, whether fresh or stale.
  pub async fn get_entry<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
    match self.read_entry(key).await {
      Ok(entry) => entry,
      Err(e) => {
        warn!(key, error = %e, "cache read failed, treating as miss");
        None
      }
    }
  }

  async fn read_entry<T: DeserializeOwned>(
    &self,
    key: &str,
  ) -> Result<Option<CacheEntry<T>>, StoreError> {
    let Some(raw) = self.store.get(key).await? else {
      return Ok(None);
    };

    serde_json::from_str(&raw)
      .map(Some)
      .map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
      })
  }

  /// Whether `entry` is still within its TTL.
  ///
  /// An entry stamped later than the current clock reading is treated as stale.
  pub fn is_fresh<T>(&self, entry: &CacheEntry<T>) -> bool {
    if entry.ttl_ms == 0 {
      return true;
    }

    let age = self.now().signed_duration_since(entry.stored_at);
    if age < chrono::Duration::zero() {
      return false;
    }

    let ttl_ms = i64::try_from(entry.ttl_ms).unwrap_or(i64::MAX);
    age.num_milliseconds() < ttl_ms
  }

  /// Value for `key` only if present and fresh.
  pub async fn get_with_ttl<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let entry = self.get_entry::<T>(key).await?;
    if self.is_fresh(&entry) {
      Some(entry.value)
    } else {
      debug!(key, stored_at = %entry.stored_at, "cache entry is stale");
      None
    }
  }

  /// Overwrite `key`, stamping the current time. A zero `ttl` never expires.
  pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
    let entry = CacheEntry {
      stored_at: self.now(),
      ttl_ms: u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX),
      value,
    };

    let raw = match serde_json::to_string(&entry) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(key, error = %e, "failed to serialize cache entry, not caching");
        return;
      }
    };

    if let Err(e) = self.store.set(key, &raw).await {
      warn!(key, error = %e, "cache write failed");
    }
  }

  /// Evict `key`.
  pub async fn invalidate(&self, key: &str) {
    match self.store.delete(key).await {
      Ok(()) => debug!(key, "cache entry invalidated"),
      Err(e) => warn!(key, error = %e, "cache invalidation failed"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::storage::MemoryStore;
  use crate::testutil::{FailingStore, ManualClock};

  fn cache_with_clock() -> (TtlCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::default());
    let cache = TtlCache::new(Arc::new(MemoryStore::new()), clock.clone());
    (cache, clock)
  }

  #[tokio::test]
  async fn test_value_expires_after_ttl() {
    let (cache, clock) = cache_with_clock();
    let ttl = Duration::from_secs(600);

    cache.set_with_ttl("k", &vec![1, 2, 3], ttl).await;
    assert_eq!(cache.get_with_ttl::<Vec<i32>>("k").await, Some(vec![1, 2, 3]));

    clock.advance(Duration::from_secs(599));
    assert_eq!(cache.get_with_ttl::<Vec<i32>>("k").await, Some(vec![1, 2, 3]));

    clock.advance(Duration::from_secs(1));
    assert_eq!(cache.get_with_ttl::<Vec<i32>>("k").await, None);
  }

  #[tokio::test]
  async fn test_zero_ttl_never_expires() {
    let (cache, clock) = cache_with_clock();
    cache.set_with_ttl("k", &"forever", Duration::ZERO).await;

    clock.advance(Duration::from_secs(60 * 60 * 24 * 365));
    assert_eq!(
      cache.get_with_ttl::<String>("k").await.as_deref(),
      Some("forever")
    );
  }

  #[tokio::test]
  async fn test_get_entry_returns_stale_value() {
    let (cache, clock) = cache_with_clock();
    cache
      .set_with_ttl("k", &"old", Duration::from_secs(10))
      .await;
    clock.advance(Duration::from_secs(11));

    assert_eq!(cache.get_with_ttl::<String>("k").await, None);

    let entry = cache.get_entry::<String>("k").await.unwrap();
    assert_eq!(entry.value, "old");
    assert_eq!(entry.ttl_ms, 10_000);
    assert!(!cache.is_fresh(&entry));
  }

  #[tokio::test]
  async fn test_future_timestamp_is_stale() {
    let (cache, clock) = cache_with_clock();
    let entry = CacheEntry {
      stored_at: clock.now() + chrono::Duration::minutes(5),
      ttl_ms: 60_000,
      value: (),
    };
    assert!(!cache.is_fresh(&entry));
  }

  #[tokio::test]
  async fn test_overwrite_restamps_entry() {
    let (cache, clock) = cache_with_clock();
    let ttl = Duration::from_secs(10);

    cache.set_with_ttl("k", &1, ttl).await;
    clock.advance(Duration::from_secs(8));
    cache.set_with_ttl("k", &2, ttl).await;
    clock.advance(Duration::from_secs(8));

    assert_eq!(cache.get_with_ttl::<i32>("k").await, Some(2));
  }

  #[tokio::test]
  async fn test_store_failures_degrade_to_miss() {
    let cache = TtlCache::new(Arc::new(FailingStore), Arc::new(ManualClock::default()));

    cache.set_with_ttl("k", &1, Duration::from_secs(10)).await;
    assert_eq!(cache.get_with_ttl::<i32>("k").await, None);
    assert!(cache.get_entry::<i32>("k").await.is_none());
    cache.invalidate("k").await;
  }

  #[tokio::test]
  async fn test_corrupt_entry_is_a_miss() {
    let store = Arc::new(MemoryStore::new());
    store.set("k", "{not json").await.unwrap();
    let cache = TtlCache::new(store, Arc::new(ManualClock::default()));

    assert!(cache.get_entry::<i32>("k").await.is_none());
  }

  #[tokio::test]
  async fn test_invalidate_removes_entry() {
    let (cache, _clock) = cache_with_clock();
    cache.set_with_ttl("k", &1, Duration::ZERO).await;
    cache.invalidate("k").await;
    assert!(cache.get_entry::<i32>("k").await.is_none());
  }
}
