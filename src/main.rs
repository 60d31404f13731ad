mod actions;
mod api;
mod app;
mod cache;
mod commands;
mod config;
mod event;
mod i18n;
mod query;
mod search;
mod ui;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use api::CachedApiClient;
use cache::{CacheStore, KvStore, NoopStore, SqliteStore};
use i18n::Language;
use search::SearchHistory;
use ui::ViewContext;

#[derive(Parser, Debug)]
#[command(name = "placebook")]
#[command(about = "Browse local businesses from the terminal, online or off")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./placebook.yaml or $XDG_CONFIG_HOME/placebook/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API server URL (overrides config and PLACEBOOK_API_URL)
  #[arg(long)]
  api_url: Option<String>,

  /// Keep the cache in memory only
  #[arg(long)]
  no_persist: bool,

  /// Display language (en, ru)
  #[arg(short, long)]
  language: Option<Language>,
}

/// Log to a file under the data directory; the terminal belongs to the UI.
///
/// `RUST_LOG` controls the level (default info). The returned guard flushes
/// the writer when dropped.
fn init_tracing() -> Result<WorkerGuard> {
  let log_dir = config::data_dir()?;
  std::fs::create_dir_all(&log_dir)?;
  let (writer, guard) =
    tracing_appender::non_blocking(tracing_appender::rolling::never(log_dir, "placebook.log"));

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .with(filter)
    .init();

  Ok(guard)
}

/// The persisted cache tier, or an in-memory stand-in.
///
/// A cache that can't be opened is not fatal; the app runs without one.
fn open_store(config: &config::Config) -> Arc<dyn KvStore> {
  if !config.cache.persist {
    info!("cache persistence disabled");
    return Arc::new(NoopStore);
  }

  match config.cache_path().and_then(|path| SqliteStore::open(&path)) {
    Ok(store) => Arc::new(store),
    Err(e) => {
      warn!("running without a persisted cache: {}", e);
      Arc::new(NoopStore)
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();
  let _log_guard = init_tracing()?;
  info!("placebook starting");

  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(url) = args.api_url {
    config.api.url = url;
  }
  if args.no_persist {
    config.cache.persist = false;
  }
  if let Some(language) = args.language {
    config.language = language;
  }

  let persisted = open_store(&config);
  let api = CachedApiClient::new(&config, CacheStore::new(persisted.clone()))?;
  let history = SearchHistory::load(persisted);
  let ctx = ViewContext::new(api, history, config.language);

  let mut app = app::App::new(&config, ctx);
  app.run().await?;

  info!("placebook exiting");
  Ok(())
}
