//! Two-tier cache store: process memory in front of a persisted key/value store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::{debug, warn};

use super::error::CacheError;
use super::storage::KvStore;
use super::traits::{CacheRecord, PersistedRecord};

/// Process-wide cache of resource documents.
///
/// Cloning is cheap and every clone shares the same tiers. There is no
/// per-key coordination: concurrent writers race and the last `set` wins.
/// Each `set` swaps in a whole record, so readers never observe a partial one.
#[derive(Clone)]
pub struct CacheStore {
  memory: Arc<RwLock<HashMap<String, CacheRecord>>>,
  persisted: Arc<dyn KvStore>,
}

impl CacheStore {
  pub fn new(persisted: Arc<dyn KvStore>) -> Self {
    Self {
      memory: Arc::new(RwLock::new(HashMap::new())),
      persisted,
    }
  }

  /// The persisted tier, for callers that keep their own documents there.
  pub fn persisted(&self) -> &Arc<dyn KvStore> {
    &self.persisted
  }

  /// Look a key up, memory first, then the persisted tier.
  ///
  /// Persisted hits are promoted into memory. Unreadable or corrupt
  /// persisted entries are logged and reported as absent.
  pub fn get(&self, key: &str) -> Option<CacheRecord> {
    if let Some(record) = self.memory_get(key) {
      debug!(key, "cache hit (memory)");
      return Some(record);
    }

    match self.read_persisted(key) {
      Ok(Some(record)) => {
        debug!(key, "cache hit (persisted)");
        self.memory_put(record.clone());
        Some(record)
      }
      Ok(None) => {
        debug!(key, "cache miss");
        None
      }
      Err(e) => {
        warn!(key, error = %e, "ignoring unreadable cache entry");
        None
      }
    }
  }

  /// Store a record in both tiers.
  ///
  /// The memory tier is always updated. A failed persisted write is logged
  /// and otherwise ignored.
  pub fn set(&self, key: &str, record: CacheRecord) {
    let record = CacheRecord { key: key.to_string(), ..record };
    let persisted = PersistedRecord::from_record(&record);
    self.memory_put(record);

    if let Err(e) = self.write_persisted(key, &persisted) {
      warn!(key, error = %e, "cache write failed, keeping in-memory copy only");
    }
  }

  /// Drop a key from both tiers.
  pub fn remove(&self, key: &str) -> Result<(), CacheError> {
    if let Ok(mut memory) = self.memory.write() {
      memory.remove(key);
    }
    self.persisted.remove(key)
  }

  fn memory_get(&self, key: &str) -> Option<CacheRecord> {
    self.memory.read().ok()?.get(key).cloned()
  }

  fn memory_put(&self, record: CacheRecord) {
    match self.memory.write() {
      Ok(mut memory) => {
        memory.insert(record.key.clone(), record);
      }
      Err(e) => warn!(key = %record.key, "memory cache lock poisoned: {}", e),
    }
  }

  fn read_persisted(&self, key: &str) -> Result<Option<CacheRecord>, CacheError> {
    let Some(raw) = self.persisted.get(key)? else {
      return Ok(None);
    };

    let stored: PersistedRecord =
      serde_json::from_str(&raw).map_err(|e| CacheError::read(key, e))?;

    Ok(Some(stored.into_record(key)))
  }

  fn write_persisted(&self, key: &str, record: &PersistedRecord) -> Result<(), CacheError> {
    let raw = serde_json::to_string(record).map_err(|e| CacheError::write(key, e))?;
    self.persisted.set(key, &raw)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::cache::storage::SqliteStore;
  use chrono::Utc;
  use serde_json::json;

  /// Persisted tier whose writes always fail, as if the disk were full.
  pub(crate) struct ReadOnlyStore(pub SqliteStore);

  impl KvStore for ReadOnlyStore {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
      self.0.get(key)
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), CacheError> {
      Err(CacheError::write(key, "database or disk is full"))
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
      self.0.remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, CacheError> {
      self.0.keys()
    }
  }

  pub(crate) fn memory_backed() -> (CacheStore, Arc<SqliteStore>) {
    let kv = Arc::new(SqliteStore::open_in_memory().unwrap());
    (CacheStore::new(kv.clone()), kv)
  }

  #[test]
  fn test_set_then_get_returns_same_record() {
    let (store, _) = memory_backed();
    let now = Utc::now();
    let record = CacheRecord::new("item:1", json!({"id": 1, "name": "Saffran"}), now);

    store.set("item:1", record.clone());

    assert_eq!(store.get("item:1"), Some(record));
  }

  #[test]
  fn test_set_writes_through_to_persisted_tier() {
    let (store, kv) = memory_backed();
    let now = Utc::now();
    store.set("photos:2", CacheRecord::new("photos:2", json!({"photos": []}), now));

    // A fresh store over the same persisted tier sees the record (cold start)
    let cold = CacheStore::new(kv);
    let record = cold.get("photos:2").unwrap();
    assert_eq!(record.payload, json!({"photos": []}));
    assert_eq!(record.fetched_at, now);
  }

  #[test]
  fn test_set_uses_the_given_key() {
    let (store, _) = memory_backed();
    store.set("item:5", CacheRecord::new("other", json!(5), Utc::now()));
    assert_eq!(store.get("item:5").unwrap().key, "item:5");
    assert!(store.get("other").is_none());
  }

  #[test]
  fn test_persisted_hit_is_promoted_to_memory() {
    let (store, kv) = memory_backed();
    let now = Utc::now();
    store.set("item:3", CacheRecord::new("item:3", json!({"id": 3}), now));

    let cold = CacheStore::new(kv.clone());
    assert!(cold.get("item:3").is_some());

    // Remove from disk behind the store's back; memory still answers
    kv.remove("item:3").unwrap();
    assert!(cold.get("item:3").is_some());
  }

  #[test]
  fn test_corrupt_persisted_entry_is_a_miss() {
    let (store, kv) = memory_backed();
    kv.set("item:9", "{not json").unwrap();

    assert!(store.get("item:9").is_none());
    // Left in place for the janitor to deal with
    assert!(kv.get("item:9").unwrap().is_some());
  }

  #[test]
  fn test_failed_persisted_write_keeps_memory_copy() {
    let store = CacheStore::new(Arc::new(ReadOnlyStore(
      SqliteStore::open_in_memory().unwrap(),
    )));
    let record = CacheRecord::new("item:1", json!({"id": 1}), Utc::now());

    store.set("item:1", record.clone());

    assert_eq!(store.get("item:1"), Some(record));
    assert!(store.persisted().get("item:1").unwrap().is_none());
  }

  #[test]
  fn test_last_write_wins() {
    let (store, _) = memory_backed();
    let first = CacheRecord::new("item:1", json!({"v": 1}), Utc::now());
    let second = CacheRecord::new("item:1", json!({"v": 2}), Utc::now());

    store.set("item:1", first);
    store.set("item:1", second.clone());

    assert_eq!(store.get("item:1"), Some(second));
  }

  #[test]
  fn test_remove_clears_both_tiers() {
    let (store, kv) = memory_backed();
    store.set("item:1", CacheRecord::new("item:1", json!(1), Utc::now()));

    store.remove("item:1").unwrap();

    assert!(store.get("item:1").is_none());
    assert!(kv.get("item:1").unwrap().is_none());
  }
}
