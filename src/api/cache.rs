//! Cache keys for directory resources.

use crate::cache::CacheKey;

/// Kinds of cached documents. The prefix is also what the janitor sweeps by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
  /// Item document as shown by the detail view
  Item,
  /// Item document as shown by the photo gallery
  Photos,
  /// Single category document
  Category,
  /// Full category list
  Categories,
  /// Full item list
  Items,
}

impl ResourceKind {
  pub fn name(self) -> &'static str {
    match self {
      Self::Item => "item",
      Self::Photos => "photos",
      Self::Category => "category",
      Self::Categories => "categories",
      Self::Items => "items",
    }
  }
}

/// Key for one cached resource document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceKey {
  pub kind: ResourceKind,
  pub id: Option<u64>,
}

impl ResourceKey {
  pub fn item(id: u64) -> Self {
    Self {
      kind: ResourceKind::Item,
      id: Some(id),
    }
  }

  pub fn photos(id: u64) -> Self {
    Self {
      kind: ResourceKind::Photos,
      id: Some(id),
    }
  }

  pub fn category(id: u64) -> Self {
    Self {
      kind: ResourceKind::Category,
      id: Some(id),
    }
  }

  pub fn categories() -> Self {
    Self {
      kind: ResourceKind::Categories,
      id: None,
    }
  }

  pub fn items() -> Self {
    Self {
      kind: ResourceKind::Items,
      id: None,
    }
  }
}

impl CacheKey for ResourceKey {
  fn cache_key(&self) -> String {
    match self.id {
      Some(id) => format!("{}:{}", self.kind.name(), id),
      None => self.kind.name().to_string(),
    }
  }

  fn prefix(&self) -> String {
    match self.id {
      Some(_) => format!("{}:", self.kind.name()),
      // Collections have no id, so the whole key is the prefix
      None => self.kind.name().to_string(),
    }
  }

  fn description(&self) -> String {
    match (self.kind, self.id) {
      (ResourceKind::Item, Some(id)) => format!("item {}", id),
      (ResourceKind::Photos, Some(id)) => format!("photos of item {}", id),
      (ResourceKind::Category, Some(id)) => format!("category {}", id),
      (ResourceKind::Categories, _) => "all categories".to_string(),
      (ResourceKind::Items, _) => "all items".to_string(),
      (kind, None) => kind.name().to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_keys_are_type_plus_id() {
    assert_eq!(ResourceKey::item(7).cache_key(), "item:7");
    assert_eq!(ResourceKey::photos(7).cache_key(), "photos:7");
    assert_eq!(ResourceKey::category(3).cache_key(), "category:3");
    assert_eq!(ResourceKey::categories().cache_key(), "categories");
    assert_eq!(ResourceKey::items().cache_key(), "items");
  }

  #[test]
  fn test_prefixes_include_separator() {
    assert_eq!(ResourceKey::photos(1).prefix(), "photos:");
    assert!(ResourceKey::photos(12).cache_key().starts_with(&ResourceKey::photos(1).prefix()));
    // "item:" must not match "items"
    assert!(!"items".starts_with(&ResourceKey::item(1).prefix()));
  }

  #[test]
  fn test_description() {
    assert_eq!(ResourceKey::photos(2).description(), "photos of item 2");
    assert_eq!(ResourceKey::categories().description(), "all categories");
  }
}
