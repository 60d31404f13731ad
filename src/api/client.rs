use crate::api::types::{Category, Item};
use crate::cache::CacheError;
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Directory API client
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base: Url,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let base = parse_base_url(&config.api.url)?;

    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.api.timeout_secs))
      .user_agent(concat!("placebook/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  /// Root URL of the API server (media paths resolve against it)
  pub fn base_url(&self) -> &Url {
    &self.base
  }

  /// List all categories
  pub async fn get_categories(&self) -> Result<Vec<Category>, CacheError> {
    self.get_json("api/categories/").await
  }

  /// Get a single category by id
  pub async fn get_category(&self, id: u64) -> Result<Category, CacheError> {
    self.get_json(&format!("api/categories/{}/", id)).await
  }

  /// List all items
  pub async fn get_items(&self) -> Result<Vec<Item>, CacheError> {
    self.get_json("api/items/").await
  }

  /// Get a single item by id
  pub async fn get_item(&self, id: u64) -> Result<Item, CacheError> {
    self.get_json(&format!("api/items/{}/", id)).await
  }

  /// GET a path and decode the JSON body. Non-success statuses and
  /// non-JSON bodies are both errors.
  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CacheError> {
    let url = self
      .base
      .join(path)
      .map_err(|e| CacheError::Network(format!("Invalid request path {}: {}", path, e)))?;

    debug!(url = %url, "GET");
    let response = self.http.get(url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(CacheError::Status {
        status: status.as_u16(),
        url: url.to_string(),
      });
    }

    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
  }
}

/// Parse the configured base URL, making sure it ends with a slash so
/// relative joins append instead of replacing the last segment.
fn parse_base_url(raw: &str) -> Result<Url> {
  let raw = raw.trim();
  if raw.is_empty() {
    return Err(eyre!(
      "No API URL configured. Set api.url in the config file or PLACEBOOK_API_URL."
    ));
  }

  let with_slash = if raw.ends_with('/') {
    raw.to_string()
  } else {
    format!("{}/", raw)
  };

  let url = Url::parse(&with_slash).map_err(|e| eyre!("Invalid API URL '{}': {}", raw, e))?;
  match url.scheme() {
    "http" | "https" => Ok(url),
    other => Err(eyre!("Unsupported API URL scheme '{}' in {}", other, raw)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_base_url_adds_trailing_slash() {
    let url = parse_base_url("http://157.230.109.162:8000").unwrap();
    assert_eq!(url.as_str(), "http://157.230.109.162:8000/");
    assert_eq!(
      url.join("api/items/4/").unwrap().as_str(),
      "http://157.230.109.162:8000/api/items/4/"
    );
  }

  #[test]
  fn test_parse_base_url_keeps_path_prefix() {
    let url = parse_base_url("https://example.com/directory").unwrap();
    assert_eq!(
      url.join("api/categories/").unwrap().as_str(),
      "https://example.com/directory/api/categories/"
    );
  }

  #[test]
  fn test_parse_base_url_rejects_bad_input() {
    assert!(parse_base_url("").is_err());
    assert!(parse_base_url("ftp://example.com").is_err());
    assert!(parse_base_url("not a url").is_err());
  }

  #[tokio::test]
  async fn test_unreachable_server_is_network_error() {
    let mut config = Config::default();
    // Port 9 (discard) on localhost is closed on test machines
    config.api.url = "http://127.0.0.1:9".to_string();
    config.api.timeout_secs = 2;

    let client = ApiClient::new(&config).unwrap();
    let err = client.get_item(1).await.unwrap_err();
    assert!(err.is_network());
  }
}
