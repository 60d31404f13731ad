//! Services handed to every view.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::api::CachedApiClient;
use crate::i18n::{Labels, Language};
use crate::search::SearchHistory;

/// Shared handles passed into views on construction.
///
/// Views live on the UI thread only, so shared mutable state uses `Rc`.
/// The API client is `Send` and is cloned into fetch tasks.
#[derive(Clone)]
pub struct ViewContext {
  pub api: CachedApiClient,
  pub history: Rc<RefCell<SearchHistory>>,
  language: Rc<Cell<Language>>,
}

impl ViewContext {
  pub fn new(api: CachedApiClient, history: SearchHistory, language: Language) -> Self {
    Self {
      api,
      history: Rc::new(RefCell::new(history)),
      language: Rc::new(Cell::new(language)),
    }
  }

  pub fn language(&self) -> Language {
    self.language.get()
  }

  /// Switch language for every view sharing this context
  pub fn set_language(&self, language: Language) {
    self.language.set(language);
  }

  pub fn labels(&self) -> &'static Labels {
    self.language().labels()
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::cache::{CacheStore, SqliteStore};
  use crate::config::Config;
  use std::sync::Arc;

  /// A context whose API points at a closed port, over an in-memory store.
  pub(crate) fn offline_context() -> ViewContext {
    let mut config = Config::default();
    config.api.url = "http://127.0.0.1:9".to_string();
    let kv = Arc::new(SqliteStore::open_in_memory().unwrap());
    let api = CachedApiClient::new(&config, CacheStore::new(kv.clone())).unwrap();
    ViewContext::new(api, SearchHistory::load(kv), Language::En)
  }

  #[test]
  fn test_language_is_shared_between_clones() {
    let ctx = offline_context();
    let other = ctx.clone();
    ctx.set_language(Language::Ru);
    assert_eq!(other.language(), Language::Ru);
    assert_eq!(other.labels().closed, "Закрыто");
  }
}
