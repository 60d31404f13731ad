//! Stale-while-revalidate caching for resource documents.
//!
//! This module provides the API-agnostic caching mechanism that:
//! - Keeps resource documents in process memory, mirrored to a persisted key/value store
//! - Serves cached documents immediately while views refresh in the background
//! - Writes every successful fetch through both tiers as a whole-record replacement
//! - Sweeps persisted entries older than a fixed age

mod error;
mod janitor;
mod layer;
mod storage;
mod store;
mod traits;

pub use error::CacheError;
pub use janitor::{SweepReport, DEFAULT_MAX_AGE_HOURS};
pub use layer::CacheLayer;
pub use storage::{KvStore, NoopStore, SqliteStore};
pub use store::CacheStore;
pub use traits::{CacheKey, CacheRecord, CacheSource};
