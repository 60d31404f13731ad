//! Age-based cleanup of persisted cache entries.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::store::CacheStore;

/// Entries older than this are swept unless configured otherwise.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24;

/// Only the timestamp of a persisted record is needed to decide its fate.
#[derive(Deserialize)]
struct Stamp {
  fetched_at: DateTime<Utc>,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
  /// Keys under the prefix that were looked at
  pub examined: usize,
  /// Keys deleted for being too old
  pub removed: usize,
  /// Keys left alone because they could not be read or parsed
  pub skipped: usize,
}

/// Deletes persisted entries whose age exceeds `max_age`.
///
/// There is no size bound and no LRU; age is the only criterion.
#[derive(Clone)]
pub struct Janitor {
  store: CacheStore,
  max_age: Duration,
}

impl Janitor {
  pub fn new(store: CacheStore, max_age: Duration) -> Self {
    Self { store, max_age }
  }

  /// Sweep every persisted key starting with `prefix`.
  pub fn sweep(&self, prefix: &str) -> SweepReport {
    self.sweep_at(prefix, Utc::now())
  }

  /// Sweep as if the current time were `now`.
  pub fn sweep_at(&self, prefix: &str, now: DateTime<Utc>) -> SweepReport {
    let mut report = SweepReport::default();

    let keys = match self.store.persisted().keys() {
      Ok(keys) => keys,
      Err(e) => {
        warn!(prefix, error = %e, "cache sweep could not list keys");
        return report;
      }
    };

    for key in keys.iter().filter(|k| k.starts_with(prefix)) {
      report.examined += 1;

      let fetched_at = match self.stamp(key) {
        Ok(Some(fetched_at)) => fetched_at,
        Ok(None) => continue,
        Err(reason) => {
          warn!(key = %key, "skipping unreadable cache entry: {}", reason);
          report.skipped += 1;
          continue;
        }
      };

      if now - fetched_at > self.max_age {
        match self.store.remove(key) {
          Ok(()) => report.removed += 1,
          Err(e) => {
            warn!(key = %key, error = %e, "failed to remove expired cache entry");
            report.skipped += 1;
          }
        }
      }
    }

    info!(
      prefix,
      examined = report.examined,
      removed = report.removed,
      skipped = report.skipped,
      "cache sweep finished"
    );

    report
  }

  /// Run a sweep on the blocking pool so the caller's loop keeps rendering.
  pub fn spawn_sweep(&self, prefix: impl Into<String>) -> JoinHandle<SweepReport> {
    let janitor = self.clone();
    let prefix = prefix.into();
    tokio::task::spawn_blocking(move || janitor.sweep(&prefix))
  }

  fn stamp(&self, key: &str) -> Result<Option<DateTime<Utc>>, String> {
    let raw = self.store.persisted().get(key).map_err(|e| e.to_string())?;
    match raw {
      Some(raw) => {
        let stamp: Stamp = serde_json::from_str(&raw).map_err(|e| e.to_string())?;
        Ok(Some(stamp.fetched_at))
      }
      // Deleted between listing and reading
      None => Ok(None),
    }
  }
}
