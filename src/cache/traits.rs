//! Core traits and types for the caching system.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use super::error::CacheError;

/// A typed handle for a cache entry.
///
/// Keys are readable strings of the form `<resource-type>:<id>`, or just
/// `<resource-type>` for collections. The prefix is what the janitor sweeps by.
pub trait CacheKey {
  /// Full cache key (e.g., "item:7")
  fn cache_key(&self) -> String;

  /// Resource-type prefix including the separator (e.g., "item:")
  fn prefix(&self) -> String;

  /// Human-readable description for logs
  fn description(&self) -> String;
}

/// A cached resource document together with when it was fetched.
///
/// The payload is always a whole document from one successful fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRecord<T = Value> {
  pub key: String,
  pub payload: T,
  pub fetched_at: DateTime<Utc>,
}

impl<T> CacheRecord<T> {
  pub fn new(key: impl Into<String>, payload: T, fetched_at: DateTime<Utc>) -> Self {
    Self {
      key: key.into(),
      payload,
      fetched_at,
    }
  }
}

impl CacheRecord<Value> {
  /// Build an untyped record from a typed payload.
  pub fn encode<T: Serialize>(
    key: &str,
    payload: &T,
    fetched_at: DateTime<Utc>,
  ) -> Result<Self, CacheError> {
    let payload = serde_json::to_value(payload).map_err(|e| CacheError::write(key, e))?;
    Ok(Self::new(key, payload, fetched_at))
  }

  /// Decode the payload into a concrete resource type.
  pub fn decode<T: DeserializeOwned>(self) -> Result<CacheRecord<T>, CacheError> {
    let payload = serde_json::from_value(self.payload).map_err(|e| CacheError::read(&self.key, e))?;
    Ok(CacheRecord {
      key: self.key,
      payload,
      fetched_at: self.fetched_at,
    })
  }
}

/// On-disk shape of a record in the persisted key/value store.
///
/// The key is not repeated inside the value.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedRecord {
  pub payload: Value,
  pub fetched_at: DateTime<Utc>,
}

impl PersistedRecord {
  pub fn from_record(record: &CacheRecord) -> Self {
    Self {
      payload: record.payload.clone(),
      fetched_at: record.fetched_at,
    }
  }

  pub fn into_record(self, key: &str) -> CacheRecord {
    CacheRecord::new(key, self.payload, self.fetched_at)
  }
}

/// Indicates where data shown by a view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from the network
  Network,
  /// Data seeded from the cache, a refresh may still be pending
  Cache,
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Doc {
    id: u64,
    name: String,
  }

  #[test]
  fn test_encode_decode_keeps_payload_and_timestamp() {
    let now = Utc::now();
    let doc = Doc {
      id: 4,
      name: "Saffran".into(),
    };

    let record = CacheRecord::encode("item:4", &doc, now).unwrap();
    assert_eq!(record.payload, json!({"id": 4, "name": "Saffran"}));

    let typed: CacheRecord<Doc> = record.decode().unwrap();
    assert_eq!(typed.payload, doc);
    assert_eq!(typed.fetched_at, now);
    assert_eq!(typed.key, "item:4");
  }

  #[test]
  fn test_decode_wrong_shape_is_read_error() {
    let record = CacheRecord::new("item:4", json!({"unexpected": true}), Utc::now());
    let err = record.decode::<Doc>().unwrap_err();
    assert!(matches!(err, CacheError::CacheRead { ref key, .. } if key == "item:4"));
  }

  #[test]
  fn test_persisted_record_round_trips_through_json() {
    let now = Utc::now();
    let record = CacheRecord::new("photos:9", json!({"photos": ["a.jpg"]}), now);
    let text = serde_json::to_string(&PersistedRecord::from_record(&record)).unwrap();
    let back: PersistedRecord = serde_json::from_str(&text).unwrap();
    assert_eq!(back.into_record("photos:9"), record);
  }
}
