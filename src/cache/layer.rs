//! Cache layer that orchestrates the stale-while-revalidate protocol.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use super::traits::{CacheResult, FetchOptions, UpdateCallback};
use super::ttl::TtlCache;
use crate::error::DashResult;

/// Cache layer that manages caching logic and network fetching.
///
/// This layer sits between the aggregators and the remote API. Refreshes for
/// the same key are neither de-duplicated nor ordered: whichever completes
/// last is what the cache holds.
#[derive(Clone)]
pub struct CacheLayer {
  cache: TtlCache,
}

impl CacheLayer {
  pub fn new(cache: TtlCache) -> Self {
    Self { cache }
  }

  pub fn ttl_cache(&self) -> &TtlCache {
    &self.cache
  }

  /// Fetch `key` through the cache.
  ///
  /// 1. Without SWR: return the entry if fresh, otherwise fetch, persist, return
  /// 2. With SWR and any entry (fresh or stale): return it now and refresh in
  ///    a detached task that reports through `on_update`
  /// 3. With SWR and no entry: fetch, persist, return
  ///
  /// Foreground fetch errors propagate. Nothing is retried.
  pub async fn fetch<T, F, Fut>(
    &self,
    key: &str,
    ttl: Duration,
    options: FetchOptions<T>,
    fetcher: F,
  ) -> DashResult<CacheResult<T>>
  where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = DashResult<T>> + Send + 'static,
  {
    if let Some(entry) = self.cache.get_entry::<T>(key).await {
      let fresh = self.cache.is_fresh(&entry);

      if options.swr {
        debug!(key, fresh, "serving cached value, refreshing in background");
        self.spawn_refresh(key.to_string(), ttl, options.on_update, fetcher);
        return Ok(CacheResult::from_cache(entry.value, entry.stored_at, !fresh));
      }

      if fresh {
        return Ok(CacheResult::from_cache(entry.value, entry.stored_at, false));
      }
      debug!(key, "cached value is stale, fetching");
    }

    let data = fetcher().await?;
    self.cache.set_with_ttl(key, &data, ttl).await;
    Ok(CacheResult::from_network(data))
  }

  /// Re-run `fetcher` detached from the caller. Failures stay inside the task.
  fn spawn_refresh<T, F, Fut>(
    &self,
    key: String,
    ttl: Duration,
    on_update: Option<UpdateCallback<T>>,
    fetcher: F,
  ) where
    T: Serialize + Send + Sync + 'static,
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = DashResult<T>> + Send + 'static,
  {
    let cache = self.cache.clone();

    tokio::spawn(async move {
      match fetcher().await {
        Ok(data) => {
          cache.set_with_ttl(&key, &data, ttl).await;
          debug!(key = %key, "background refresh stored");
          if let Some(callback) = on_update {
            callback(data);
          }
        }
        Err(e) => {
          warn!(key = %key, error = %e, "background refresh failed, keeping cached value");
        }
      }
    });
  }
}
