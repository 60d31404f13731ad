//! Cache layer that ties network fetching to the cache store.

use chrono::{Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::CacheError;
use super::janitor::{Janitor, SweepReport};
use super::store::CacheStore;
use super::traits::{CacheKey, CacheRecord};

/// Cache layer that manages write-through refreshes and cache reads.
///
/// This sits between views and the network client. Reads never touch the
/// network; refreshes always do and never retry.
#[derive(Clone)]
pub struct CacheLayer {
  store: CacheStore,
  janitor: Janitor,
}

impl CacheLayer {
  /// Create a cache layer over the given store.
  pub fn new(store: CacheStore, max_age: Duration) -> Self {
    let janitor = Janitor::new(store.clone(), max_age);
    Self { store, janitor }
  }

  #[allow(dead_code)]
  pub fn store(&self) -> &CacheStore {
    &self.store
  }

  /// Read a cached record without going to the network.
  ///
  /// A record whose payload no longer matches `T` is treated as a miss.
  pub fn cached<T, K>(&self, key: &K) -> Option<CacheRecord<T>>
  where
    T: DeserializeOwned,
    K: CacheKey,
  {
    let cache_key = key.cache_key();
    let record = self.store.get(&cache_key)?;

    match record.decode() {
      Ok(record) => Some(record),
      Err(e) => {
        warn!(key = %cache_key, error = %e, "cached payload has an unexpected shape");
        None
      }
    }
  }

  /// Fetch a resource from the network and write it through both tiers.
  ///
  /// On failure the existing cache entry is left as it was and the error is
  /// returned for the caller to display.
  pub async fn refresh<T, K, F, Fut>(&self, key: &K, fetcher: F) -> Result<T, CacheError>
  where
    T: Serialize,
    K: CacheKey,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, CacheError>>,
  {
    let cache_key = key.cache_key();
    debug!(key = %cache_key, "refreshing {}", key.description());

    let data = match fetcher().await {
      Ok(data) => data,
      Err(e) if e.is_network() => {
        info!(key = %cache_key, error = %e, "offline or server error, cache left unchanged");
        return Err(e);
      }
      Err(e) => {
        warn!(key = %cache_key, error = %e, "refresh failed, cache left unchanged");
        return Err(e);
      }
    };

    let fetched_at = Utc::now();
    match CacheRecord::encode(&cache_key, &data, fetched_at) {
      Ok(record) => {
        self.store.set(&cache_key, record);
        info!(key = %cache_key, "refreshed {}", key.description());
      }
      Err(e) => warn!(key = %cache_key, error = %e, "could not cache refreshed data"),
    }

    Ok(data)
  }

  /// Sweep expired entries for a resource type in the background.
  pub fn sweep_on_mount<K: CacheKey>(&self, key: &K) -> JoinHandle<SweepReport> {
    self.janitor.spawn_sweep(key.prefix())
  }
}
