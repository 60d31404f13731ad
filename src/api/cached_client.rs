//! Cached API client that wraps ApiClient with stale-while-revalidate caching.

use color_eyre::Result;
use tokio::task::JoinHandle;
use url::Url;

use crate::cache::{CacheError, CacheLayer, CacheRecord, CacheStore, SweepReport};
use crate::config::Config;

use super::cache::{ResourceKey, ResourceKind};
use super::client::ApiClient;
use super::types::{Category, Item};

/// API client with a cache in front of it.
///
/// `cached_*` methods read the cache only and never block on the network.
/// `refresh_*` methods always hit the network and write successful results
/// through both cache tiers. Views combine the two.
#[derive(Clone)]
pub struct CachedApiClient {
  inner: ApiClient,
  cache: CacheLayer,
}

impl CachedApiClient {
  /// Create a cached client over an existing cache store.
  pub fn new(config: &Config, store: CacheStore) -> Result<Self> {
    let inner = ApiClient::new(config)?;
    let cache = CacheLayer::new(store, config.cache.max_age()?);

    Ok(Self { inner, cache })
  }

  pub fn base_url(&self) -> &Url {
    self.inner.base_url()
  }

  #[allow(dead_code)]
  pub fn store(&self) -> &CacheStore {
    self.cache.store()
  }

  /// Cached item document, as stored for the item page or the gallery.
  pub fn cached_item(&self, key: &ResourceKey) -> Option<CacheRecord<Item>> {
    debug_assert!(matches!(key.kind, ResourceKind::Item | ResourceKind::Photos));
    self.cache.cached(key)
  }

  /// Fetch an item and cache it under the given key.
  pub async fn refresh_item(&self, key: &ResourceKey) -> Result<Item, CacheError> {
    debug_assert!(matches!(key.kind, ResourceKind::Item | ResourceKind::Photos));
    debug_assert!(key.id.is_some(), "item keys carry an id");
    let id = key.id.unwrap_or_default();
    self
      .cache
      .refresh(key, || {
        let inner = self.inner.clone();
        async move { inner.get_item(id).await }
      })
      .await
  }

  pub fn cached_category(&self, id: u64) -> Option<CacheRecord<Category>> {
    self.cache.cached(&ResourceKey::category(id))
  }

  pub async fn refresh_category(&self, id: u64) -> Result<Category, CacheError> {
    self
      .cache
      .refresh(&ResourceKey::category(id), || {
        let inner = self.inner.clone();
        async move { inner.get_category(id).await }
      })
      .await
  }

  pub fn cached_categories(&self) -> Option<CacheRecord<Vec<Category>>> {
    self.cache.cached(&ResourceKey::categories())
  }

  pub async fn refresh_categories(&self) -> Result<Vec<Category>, CacheError> {
    self
      .cache
      .refresh(&ResourceKey::categories(), || {
        let inner = self.inner.clone();
        async move { inner.get_categories().await }
      })
      .await
  }

  pub fn cached_items(&self) -> Option<CacheRecord<Vec<Item>>> {
    self.cache.cached(&ResourceKey::items())
  }

  pub async fn refresh_items(&self) -> Result<Vec<Item>, CacheError> {
    self
      .cache
      .refresh(&ResourceKey::items(), || {
        let inner = self.inner.clone();
        async move { inner.get_items().await }
      })
      .await
  }

  /// Places in one category, taken from the cached item list.
  pub fn cached_items_in_category(&self, category_id: u64) -> Option<CacheRecord<Vec<Item>>> {
    self.cached_items().map(|record| CacheRecord {
      payload: in_category(record.payload, category_id),
      ..record
    })
  }

  /// Refresh the item list and keep the places in one category.
  pub async fn refresh_items_in_category(&self, category_id: u64) -> Result<Vec<Item>, CacheError> {
    let items = self.refresh_items().await?;
    Ok(in_category(items, category_id))
  }

  /// Sweep expired entries of the key's resource type in the background.
  pub fn sweep_on_mount(&self, key: &ResourceKey) -> JoinHandle<SweepReport> {
    self.cache.sweep_on_mount(key)
  }
}

fn in_category(items: Vec<Item>, category_id: u64) -> Vec<Item> {
  items
    .into_iter()
    .filter(|item| item.category == category_id)
    .collect()
}
