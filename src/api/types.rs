//! Resource documents served by the directory API.
//!
//! Fields the client doesn't use are kept in `extra` so that a cached
//! document is the whole document the API returned.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use url::Url;

/// A business category (restaurants, hotels, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub icon: Option<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A place listed in the directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
  pub id: u64,
  /// Id of the owning category
  pub category: u64,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub address: String,
  pub latitude: f64,
  pub longitude: f64,
  /// Day name ("monday") to opening hours ("11:00 - 23:00")
  #[serde(default)]
  pub working_hours: BTreeMap<String, Value>,
  #[serde(default)]
  pub whatsapp_number: String,
  /// One or more numbers in a single free-form string
  #[serde(default)]
  pub phone_numbers: String,
  #[serde(default)]
  pub avatar_photo: Option<String>,
  /// Media paths relative to the API's media root
  #[serde(default)]
  pub photos: Vec<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// Days in the order the detail view lists them.
pub const WEEK: [Weekday; 7] = [
  Weekday::Mon,
  Weekday::Tue,
  Weekday::Wed,
  Weekday::Thu,
  Weekday::Fri,
  Weekday::Sat,
  Weekday::Sun,
];

fn day_key(day: Weekday) -> &'static str {
  match day {
    Weekday::Mon => "monday",
    Weekday::Tue => "tuesday",
    Weekday::Wed => "wednesday",
    Weekday::Thu => "thursday",
    Weekday::Fri => "friday",
    Weekday::Sat => "saturday",
    Weekday::Sun => "sunday",
  }
}

impl Item {
  /// Opening hours for one day, if the API listed any.
  pub fn hours_for(&self, day: Weekday) -> Option<String> {
    let key = day_key(day);
    let value = self
      .working_hours
      .iter()
      .find(|(k, _)| k.eq_ignore_ascii_case(key))
      .map(|(_, v)| v)?;

    match value {
      Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
      Value::String(_) | Value::Null => None,
      other => Some(other.to_string()),
    }
  }

  /// Opening hours for the whole week, Monday first.
  pub fn weekly_hours(&self) -> Vec<(Weekday, Option<String>)> {
    WEEK.iter().map(|&day| (day, self.hours_for(day))).collect()
  }

  /// Absolute URLs for every photo of this place.
  pub fn photo_urls(&self, base: &Url) -> Vec<String> {
    self
      .photos
      .iter()
      .filter_map(|path| media_url(base, path))
      .collect()
  }
}

/// Resolve a media path against the API's media root.
///
/// Absolute URLs are returned unchanged.
pub fn media_url(base: &Url, path: &str) -> Option<String> {
  let path = path.trim();
  if path.is_empty() {
    return None;
  }
  if path.starts_with("http://") || path.starts_with("https://") {
    return Some(path.to_string());
  }

  base
    .join("media/")
    .and_then(|media| media.join(path.trim_start_matches('/')))
    .map(String::from)
    .ok()
}
