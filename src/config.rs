use crate::cache::DEFAULT_MAX_AGE_HOURS;
use crate::i18n::Language;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `api.url`.
pub const API_URL_ENV: &str = "PLACEBOOK_API_URL";

const APP_NAME: &str = "placebook";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub language: Language,
  #[serde(default)]
  pub contact: ContactConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Root URL of the directory API server
  #[serde(default)]
  pub url: String,
  /// Request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      url: String::new(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

fn default_timeout_secs() -> u64 {
  15
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Mirror the cache to disk so it survives restarts
  #[serde(default = "default_true")]
  pub persist: bool,
  /// Persisted entries older than this are swept
  #[serde(default = "default_max_age_hours")]
  pub max_age_hours: i64,
  /// Override for the cache database location
  pub path: Option<PathBuf>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      persist: true,
      max_age_hours: default_max_age_hours(),
      path: None,
    }
  }
}

/// Operator contact details shown on the contact screen
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactConfig {
  pub phone: Option<String>,
  pub email: Option<String>,
  pub instagram: Option<String>,
  pub whatsapp: Option<String>,
}

impl CacheConfig {
  /// `max_age_hours` as a duration.
  ///
  /// Fails for non-positive values and for values too large to represent.
  pub fn max_age(&self) -> Result<chrono::Duration> {
    if self.max_age_hours <= 0 {
      return Err(eyre!(
        "cache.max_age_hours must be positive, got {}",
        self.max_age_hours
      ));
    }
    chrono::Duration::try_hours(self.max_age_hours)
      .ok_or_else(|| eyre!("cache.max_age_hours is too large: {}", self.max_age_hours))
  }
}

fn default_true() -> bool {
  true
}

fn default_max_age_hours() -> i64 {
  DEFAULT_MAX_AGE_HOURS
}

impl Config {
  /// Load configuration from file, then apply the environment override.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./placebook.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/placebook/config.yaml
  ///
  /// Without a file, defaults are used; the API URL can then come from
  /// `PLACEBOOK_API_URL` alone.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    config.apply_env(std::env::var(API_URL_ENV).ok());
    config.validate()?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("placebook.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join(APP_NAME).join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  fn apply_env(&mut self, api_url: Option<String>) {
    if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
      self.api.url = url.trim().to_string();
    }
  }

  fn validate(&self) -> Result<()> {
    self.cache.max_age()?;
    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be at least 1"));
    }
    Ok(())
  }

  /// Where the persisted cache lives.
  pub fn cache_path(&self) -> Result<PathBuf> {
    match &self.cache.path {
      Some(path) => Ok(path.clone()),
      None => Ok(data_dir()?.join("cache.db")),
    }
  }
}

/// Per-user data directory for the cache database and logs.
pub fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join(APP_NAME))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_full_config() {
    let config = Config::from_yaml(
      r#"
api:
  url: http://157.230.109.162:8000
  timeout_secs: 5
cache:
  persist: false
  max_age_hours: 12
  path: /tmp/placebook.db
language: ru
contact:
  phone: "+996 555 000 000"
  email: hello@example.com
"#,
    )
    .unwrap();

    assert_eq!(config.api.url, "http://157.230.109.162:8000");
    assert_eq!(config.api.timeout_secs, 5);
    assert!(!config.cache.persist);
    assert_eq!(config.cache.max_age_hours, 12);
    assert_eq!(config.cache_path().unwrap(), PathBuf::from("/tmp/placebook.db"));
    assert_eq!(config.language, Language::Ru);
    assert_eq!(config.contact.email.as_deref(), Some("hello@example.com"));
    assert!(config.contact.instagram.is_none());
  }

  #[test]
  fn test_defaults() {
    let config = Config::from_yaml("api:\n  url: http://localhost:8000\n").unwrap();
    assert_eq!(config.api.timeout_secs, 15);
    assert!(config.cache.persist);
    assert_eq!(config.cache.max_age_hours, 24);
    assert_eq!(config.language, Language::En);

    assert!(Config::from_yaml("").unwrap().api.url.is_empty());
  }

  #[test]
  fn test_env_overrides_file() {
    let mut config = Config::from_yaml("api:\n  url: http://file:8000\n").unwrap();

    config.apply_env(Some("  ".to_string()));
    assert_eq!(config.api.url, "http://file:8000");

    config.apply_env(Some("http://env:8000".to_string()));
    assert_eq!(config.api.url, "http://env:8000");
  }

  #[test]
  fn test_validate_rejects_non_positive_age() {
    let config = Config::from_yaml("cache:\n  max_age_hours: 0\n").unwrap();
    assert!(config.validate().is_err());
  }

  #[test]
  fn test_validate_rejects_oversized_age() {
    let config = Config::from_yaml("cache:\n  max_age_hours: 9223372036854775807\n").unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("too large"));

    let config = Config::from_yaml("cache:\n  max_age_hours: 48\n").unwrap();
    assert_eq!(config.cache.max_age().unwrap(), chrono::Duration::hours(48));
  }

  #[test]
  fn test_explicit_missing_path_is_error() {
    assert!(Config::load(Some(Path::new("/definitely/not/here.yaml"))).is_err());
  }
}
