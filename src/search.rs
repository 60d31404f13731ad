//! Name search over places and categories, with recent and popular history.
//!
//! History lives in the persisted key/value store under keys outside any
//! cache prefix, so the janitor never sweeps it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

use crate::api::{Category, Item};
use crate::cache::KvStore;

const RECENT_KEY: &str = "recentSearches";
const CLICKS_KEY: &str = "clickCounts";

/// How many recent searches to remember
pub const MAX_RECENT: usize = 5;
/// How many popular entries to show
pub const MAX_POPULAR: usize = 5;
/// Clicks needed before an entry counts as popular
pub const POPULAR_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
  Item,
  Category,
}

/// A search result that can be opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchEntry {
  pub id: u64,
  pub name: String,
  #[serde(rename = "type")]
  pub kind: EntryKind,
}

impl SearchEntry {
  fn history_key(&self) -> String {
    let kind = match self.kind {
      EntryKind::Item => "item",
      EntryKind::Category => "category",
    };
    format!("{}:{}", kind, self.id)
  }
}

impl From<&Item> for SearchEntry {
  fn from(item: &Item) -> Self {
    Self {
      id: item.id,
      name: item.name.clone(),
      kind: EntryKind::Item,
    }
  }
}

impl From<&Category> for SearchEntry {
  fn from(category: &Category) -> Self {
    Self {
      id: category.id,
      name: category.name.clone(),
      kind: EntryKind::Category,
    }
  }
}

/// Case-insensitive substring match on names. Items come before categories.
///
/// A blank query matches nothing.
pub fn filter(query: &str, items: &[Item], categories: &[Category]) -> Vec<SearchEntry> {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return Vec::new();
  }

  let matching_items = items
    .iter()
    .filter(|item| item.name.to_lowercase().contains(&needle))
    .map(SearchEntry::from);
  let matching_categories = categories
    .iter()
    .filter(|category| category.name.to_lowercase().contains(&needle))
    .map(SearchEntry::from);

  matching_items.chain(matching_categories).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickCount {
  pub count: u32,
  #[serde(flatten)]
  pub entry: SearchEntry,
}

/// Recent searches and click counts, persisted on every change.
pub struct SearchHistory {
  store: Arc<dyn KvStore>,
  recent: Vec<SearchEntry>,
  clicks: BTreeMap<String, ClickCount>,
}

impl SearchHistory {
  /// Load history from the store. Missing or unreadable history starts empty.
  pub fn load(store: Arc<dyn KvStore>) -> Self {
    let recent = load_json(store.as_ref(), RECENT_KEY).unwrap_or_default();
    let clicks = load_json(store.as_ref(), CLICKS_KEY).unwrap_or_default();

    Self {
      store,
      recent,
      clicks,
    }
  }

  /// Most recent first
  pub fn recent(&self) -> &[SearchEntry] {
    &self.recent
  }

  /// Entries clicked at least `POPULAR_THRESHOLD` times, most clicked first.
  pub fn popular(&self) -> Vec<ClickCount> {
    let mut popular: Vec<ClickCount> = self
      .clicks
      .values()
      .filter(|c| c.count >= POPULAR_THRESHOLD)
      .cloned()
      .collect();

    // Stable sort keeps key order among equal counts
    popular.sort_by(|a, b| b.count.cmp(&a.count));
    popular.truncate(MAX_POPULAR);
    popular
  }

  /// Record that the user opened an entry.
  pub fn record_click(&mut self, entry: &SearchEntry) {
    self.recent.retain(|e| e.history_key() != entry.history_key());
    self.recent.insert(0, entry.clone());
    self.recent.truncate(MAX_RECENT);

    self
      .clicks
      .entry(entry.history_key())
      .and_modify(|c| {
        c.count += 1;
        c.entry = entry.clone();
      })
      .or_insert_with(|| ClickCount {
        count: 1,
        entry: entry.clone(),
      });

    save_json(self.store.as_ref(), RECENT_KEY, &self.recent);
    save_json(self.store.as_ref(), CLICKS_KEY, &self.clicks);
  }

  pub fn clear_click_counts(&mut self) {
    self.clicks.clear();
    if let Err(e) = self.store.remove(CLICKS_KEY) {
      warn!(error = %e, "failed to clear click counts");
    }
  }
}

fn load_json<T: serde::de::DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
  let raw = match store.get(key) {
    Ok(raw) => raw?,
    Err(e) => {
      warn!(key, error = %e, "failed to read search history");
      return None;
    }
  };

  match serde_json::from_str(&raw) {
    Ok(value) => Some(value),
    Err(e) => {
      warn!(key, error = %e, "ignoring corrupt search history");
      None
    }
  }
}

fn save_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) {
  let result = serde_json::to_string(value)
    .map_err(|e| e.to_string())
    .and_then(|raw| store.set(key, &raw).map_err(|e| e.to_string()));

  if let Err(e) = result {
    warn!(key, "failed to save search history: {}", e);
  }
}
