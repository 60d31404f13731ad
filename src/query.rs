//! Stale-while-revalidate binding between a view and its data.
//!
//! Inspired by TanStack Query, a `Query<T>` is seeded from the cache, then
//! refreshed in the background. Views poll it from their tick handler.
//!
//! # Example
//!
//! ```ignore
//! let client = api.clone();
//! let seed = api.cached_item(&key);
//! let mut query = Query::new(move || {
//!     let client = client.clone();
//!     let key = key.clone();
//!     async move { client.refresh_item(&key).await.map_err(|e| e.to_string()) }
//! })
//! .seeded(seed);
//!
//! // Cached data renders right away, a refresh runs in the background
//! query.mount();
//!
//! // In event loop tick
//! if query.poll() {
//!     // State changed, trigger re-render
//! }
//!
//! // In render
//! match query.state() {
//!     QueryState::Loading => render_spinner(),
//!     QueryState::Stale(data) | QueryState::Fresh(data) => render_data(data),
//!     QueryState::Empty => render_placeholder(),
//!     QueryState::Idle => {}
//! }
//! ```

use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;
use tokio::sync::mpsc;
use tracing::warn;

use crate::cache::{CacheRecord, CacheSource};

/// The state of a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
  /// Query has not been mounted
  Idle,
  /// No data yet, a fetch is in flight
  Loading,
  /// Showing cached or previously fetched data; it may be out of date
  Stale(T),
  /// Showing data from the latest successful fetch
  Fresh(T),
  /// No data and nothing in flight: the placeholder after a failed cold load
  Empty,
}

impl<T> QueryState<T> {
  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Stale(data) | QueryState::Fresh(data) => Some(data),
      _ => None,
    }
  }

  /// Demote fresh data to stale, keeping it.
  fn into_stale(self) -> Self {
    match self {
      QueryState::Fresh(data) | QueryState::Stale(data) => QueryState::Stale(data),
      _ => QueryState::Empty,
    }
  }
}

/// A boxed future that returns a Result<T, String>
type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, String>> + Send>>;

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Box<dyn Fn() -> BoxFuture<T> + Send + Sync>;

/// Async query with stale-while-revalidate state management.
///
/// Query<T> encapsulates:
/// - The fetching logic (via a closure)
/// - Seeding from a cache record
/// - Stale/fresh/loading/empty states
/// - Async result handling via channels
///
/// Dropping a query drops its receiver. A fetch still in flight runs to
/// completion (so the cache is updated) but its result is discarded.
pub struct Query<T> {
  state: QueryState<T>,
  fetcher: FetcherFn<T>,
  receiver: Option<mpsc::UnboundedReceiver<Result<T, String>>>,
  fetched_at: Option<DateTime<Utc>>,
  source: Option<CacheSource>,
  last_error: Option<String>,
}

impl<T: Clone + Send + 'static> Query<T> {
  /// Create a new query with the given fetcher function.
  ///
  /// The fetcher is a closure that returns a future. It is called every
  /// time a refresh starts.
  pub fn new<F, Fut>(fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, String>> + Send + 'static,
  {
    Self {
      state: QueryState::Idle,
      fetcher: Box::new(move || Box::pin(fetcher())),
      receiver: None,
      fetched_at: None,
      source: None,
      last_error: None,
    }
  }

  /// Seed the query with a cached record, if there is one.
  pub fn seeded(mut self, record: Option<CacheRecord<T>>) -> Self {
    if let Some(record) = record {
      self.state = QueryState::Stale(record.payload);
      self.fetched_at = Some(record.fetched_at);
      self.source = Some(CacheSource::Cache);
    }
    self
  }

  /// Get the current state of the query.
  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  /// Get the data currently on display, fresh or stale.
  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  /// True only while there is nothing to show yet.
  #[allow(dead_code)]
  pub fn is_loading(&self) -> bool {
    matches!(self.state, QueryState::Loading)
  }

  /// True while any fetch is outstanding, including background refreshes.
  pub fn is_refreshing(&self) -> bool {
    self.receiver.is_some()
  }

  /// When the data on display was fetched.
  pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
    self.fetched_at
  }

  /// Where the data on display came from.
  #[allow(dead_code)]
  pub fn source(&self) -> Option<CacheSource> {
    self.source
  }

  /// The error from the most recent failed fetch, cleared on success.
  pub fn last_error(&self) -> Option<&str> {
    self.last_error.as_deref()
  }

  /// Initial load: show cached data and refresh quietly, or show the
  /// loading state and fetch.
  ///
  /// Only acts on an idle or seeded query that has not started fetching.
  pub fn mount(&mut self) {
    let ready = matches!(self.state, QueryState::Idle | QueryState::Stale(_));
    if !ready || self.receiver.is_some() {
      return;
    }
    self.start_fetch();
  }

  /// Force a new refresh (manual refresh, app resumed).
  ///
  /// A pending fetch is abandoned: its result will be ignored, but the
  /// request itself is not cancelled.
  pub fn refetch(&mut self) {
    self.receiver = None;
    self.start_fetch();
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed (data arrived or fetch failed).
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    // Try to receive without blocking
    let result = match receiver.try_recv() {
      Ok(result) => result,
      Err(mpsc::error::TryRecvError::Empty) => return false,
      // Sender dropped without sending (task panicked or was aborted)
      Err(mpsc::error::TryRecvError::Disconnected) => Err("Fetch was cancelled".to_string()),
    };
    self.receiver = None;

    match result {
      Ok(data) => {
        self.state = QueryState::Fresh(data);
        self.fetched_at = Some(Utc::now());
        self.source = Some(CacheSource::Network);
        self.last_error = None;
      }
      Err(error) => {
        warn!("refresh failed, keeping last good data: {}", error);
        let previous = std::mem::replace(&mut self.state, QueryState::Empty);
        self.state = previous.into_stale();
        self.last_error = Some(error);
      }
    }
    true
  }

  /// Internal: start the fetch operation
  fn start_fetch(&mut self) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    // Keep whatever is on screen; only an empty view shows the loading state
    if self.state.data().is_none() {
      self.state = QueryState::Loading;
    }

    let future = (self.fetcher)();
    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - the view may be gone
      let _ = tx.send(result);
    });
  }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("state", &self.state)
      .field("fetched_at", &self.fetched_at)
      .field("last_error", &self.last_error)
      .finish_non_exhaustive()
  }
}
