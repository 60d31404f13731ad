//! Persisted key/value store trait and its SQLite implementation.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::error::CacheError;

/// String key/value store used as the persisted cache tier.
///
/// Values are JSON documents. The store knows nothing about their shape.
pub trait KvStore: Send + Sync {
  /// Get the raw value stored under a key.
  fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

  /// Insert or replace the value for a key.
  fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;

  /// Remove a key. Removing a missing key is not an error.
  fn remove(&self, key: &str) -> Result<(), CacheError>;

  /// List every stored key.
  fn keys(&self) -> Result<Vec<String>, CacheError>;
}

/// Store that doesn't persist anything.
/// Used when persistence is disabled - reads always miss, writes are dropped.
pub struct NoopStore;

impl KvStore for NoopStore {
  fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
    Ok(None)
  }

  fn set(&self, _key: &str, _value: &str) -> Result<(), CacheError> {
    Ok(())
  }

  fn remove(&self, _key: &str) -> Result<(), CacheError> {
    Ok(())
  }

  fn keys(&self) -> Result<Vec<String>, CacheError> {
    Ok(Vec::new())
  }
}

/// SQLite-backed key/value store.
pub struct SqliteStore {
  conn: Mutex<Connection>,
}

/// Schema for the key/value table.
const KV_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

impl SqliteStore {
  /// Open (or create) the store at the given path.
  pub fn open(path: &Path) -> Result<Self> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    Self::with_connection(conn)
  }

  /// Open a private in-memory store. Nothing survives the process.
  pub fn open_in_memory() -> Result<Self> {
    let conn = Connection::open_in_memory()
      .map_err(|e| eyre!("Failed to open in-memory cache database: {}", e))?;

    Self::with_connection(conn)
  }

  fn with_connection(conn: Connection) -> Result<Self> {
    conn
      .execute_batch(KV_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn lock(&self, key: &str) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
    self
      .conn
      .lock()
      .map_err(|e| CacheError::read(key, format!("Lock poisoned: {}", e)))
  }
}

impl KvStore for SqliteStore {
  fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
    let conn = self.lock(key)?;

    conn
      .query_row("SELECT value FROM kv WHERE key = ?", params![key], |row| {
        row.get(0)
      })
      .optional()
      .map_err(|e| CacheError::read(key, e))
  }

  fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
    let conn = self.lock(key)?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv (key, value) VALUES (?, ?)",
        params![key, value],
      )
      .map_err(|e| CacheError::write(key, e))?;

    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), CacheError> {
    let conn = self.lock(key)?;

    conn
      .execute("DELETE FROM kv WHERE key = ?", params![key])
      .map_err(|e| CacheError::write(key, e))?;

    Ok(())
  }

  fn keys(&self) -> Result<Vec<String>, CacheError> {
    let conn = self.lock("*")?;

    let mut stmt = conn
      .prepare("SELECT key FROM kv ORDER BY key")
      .map_err(|e| CacheError::read("*", e))?;

    let keys = stmt
      .query_map([], |row| row.get(0))
      .map_err(|e| CacheError::read("*", e))?
      .collect::<Result<Vec<String>, _>>()
      .map_err(|e| CacheError::read("*", e))?;

    Ok(keys)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_get_remove() {
    let store = SqliteStore::open_in_memory().unwrap();
    assert_eq!(store.get("item:1").unwrap(), None);

    store.set("item:1", r#"{"a":1}"#).unwrap();
    assert_eq!(store.get("item:1").unwrap().as_deref(), Some(r#"{"a":1}"#));

    store.set("item:1", r#"{"a":2}"#).unwrap();
    assert_eq!(store.get("item:1").unwrap().as_deref(), Some(r#"{"a":2}"#));

    store.remove("item:1").unwrap();
    assert_eq!(store.get("item:1").unwrap(), None);

    // Removing again is fine
    store.remove("item:1").unwrap();
  }

  #[test]
  fn test_keys_lists_everything() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.set("photos:2", "{}").unwrap();
    store.set("item:1", "{}").unwrap();
    store.set("recentSearches", "[]").unwrap();

    assert_eq!(
      store.keys().unwrap(),
      vec!["item:1", "photos:2", "recentSearches"]
    );
  }

  #[test]
  fn test_open_creates_parent_directories() {
    let dir = std::env::temp_dir().join(format!("placebook-test-{}", std::process::id()));
    let path = dir.join("nested").join("cache.db");

    let store = SqliteStore::open(&path).unwrap();
    store.set("k", "v").unwrap();
    drop(store);

    let reopened = SqliteStore::open(&path).unwrap();
    assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));

    let _ = std::fs::remove_dir_all(&dir);
  }

  #[test]
  fn test_noop_store_never_returns_data() {
    let store = NoopStore;
    store.set("item:1", "{}").unwrap();
    assert_eq!(store.get("item:1").unwrap(), None);
    assert!(store.keys().unwrap().is_empty());
  }
}
