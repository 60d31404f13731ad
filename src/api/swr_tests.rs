//! Stale-while-revalidate end to end: a local HTTP stub, the cached client,
//! both cache tiers and the view-side query.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::api::{CachedApiClient, Item, ResourceKey};
use crate::cache::{CacheKey, CacheRecord, CacheSource, CacheStore, KvStore, SqliteStore};
use crate::config::Config;
use crate::query::{Query, QueryState};

/// Serves one JSON body for every request until `healthy` is cleared,
/// then answers 503.
struct StubServer {
  url: String,
  healthy: Arc<AtomicBool>,
  hits: Arc<AtomicU32>,
}

impl StubServer {
  async fn start(body: serde_json::Value) -> Self {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let healthy = Arc::new(AtomicBool::new(true));
    let hits = Arc::new(AtomicU32::new(0));

    let body = body.to_string();
    let (healthy_flag, hit_count) = (healthy.clone(), hits.clone());
    tokio::spawn(async move {
      loop {
        let Ok((mut socket, _)) = listener.accept().await else {
          return;
        };
        hit_count.fetch_add(1, Ordering::SeqCst);

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
          match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => request.extend_from_slice(&buf[..n]),
          }
        }

        let response = if healthy_flag.load(Ordering::SeqCst) {
          format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
          )
        } else {
          "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string()
        };
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
      }
    });

    Self { url, healthy, hits }
  }

  fn go_down(&self) {
    self.healthy.store(false, Ordering::SeqCst);
  }
}

fn place(name: &str) -> serde_json::Value {
  json!({
    "id": 7, "category": 1, "name": name,
    "latitude": 42.87, "longitude": 74.59,
    "rating": 4.5
  })
}

fn client_for(url: &str) -> (CachedApiClient, Arc<SqliteStore>) {
  let mut config = Config::default();
  config.api.url = url.to_string();
  let kv = Arc::new(SqliteStore::open_in_memory().unwrap());
  let client = CachedApiClient::new(&config, CacheStore::new(kv.clone())).unwrap();
  (client, kv)
}

fn item_query(client: &CachedApiClient, key: &ResourceKey) -> Query<Item> {
  let api = client.clone();
  let fetch_key = key.clone();
  Query::new(move || {
    let api = api.clone();
    let key = fetch_key.clone();
    async move { api.refresh_item(&key).await.map_err(|e| e.to_string()) }
  })
  .seeded(client.cached_item(key))
}

async fn settle(query: &mut Query<Item>) {
  for _ in 0..300 {
    if query.poll() {
      return;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
  }
  panic!("query never settled");
}

#[tokio::test]
async fn test_fetch_writes_through_both_tiers() {
  let server = StubServer::start(place("Navat")).await;
  let (client, kv) = client_for(&server.url);
  let key = ResourceKey::item(7);

  let before = Utc::now();
  let item = client.refresh_item(&key).await.unwrap();
  assert_eq!(item.name, "Navat");

  let record = client.store().get(&key.cache_key()).unwrap();
  assert_eq!(record.payload["name"], "Navat");
  assert!(record.fetched_at >= before && record.fetched_at <= Utc::now());

  // The persisted copy alone is enough for a fresh process
  let restarted = CacheStore::new(kv.clone());
  assert_eq!(restarted.get(&key.cache_key()).unwrap().payload["name"], "Navat");
  assert!(kv.get("item:7").unwrap().is_some());
}

#[tokio::test]
async fn test_cold_then_warm_then_offline() {
  let server = StubServer::start(place("Navat")).await;
  let (client, _kv) = client_for(&server.url);
  let key = ResourceKey::item(7);

  // Cold: loading, then fresh from the network
  let mut first = item_query(&client, &key);
  first.mount();
  assert!(first.is_loading());
  settle(&mut first).await;
  assert_eq!(first.source(), Some(CacheSource::Network));
  assert_eq!(first.data().map(|i| i.name.as_str()), Some("Navat"));

  // Warm: a new screen shows the cached copy right away
  server.go_down();
  let mut second = item_query(&client, &key);
  second.mount();
  assert!(matches!(second.state(), QueryState::Stale(_)));
  assert_eq!(second.source(), Some(CacheSource::Cache));

  // Offline refresh: the cached copy stays on screen and in the store
  settle(&mut second).await;
  assert!(matches!(second.state(), QueryState::Stale(_)));
  assert!(second.last_error().unwrap().contains("503"));
  assert_eq!(client.cached_item(&key).unwrap().payload.name, "Navat");
  assert_eq!(server.hits.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_two_screens_fetch_independently() {
  let server = StubServer::start(place("Navat")).await;
  let (client, _kv) = client_for(&server.url);
  let key = ResourceKey::item(7);

  let mut a = item_query(&client, &key);
  let mut b = item_query(&client, &key);
  a.mount();
  b.mount();
  settle(&mut a).await;
  settle(&mut b).await;

  // No de-duplication of in-flight requests
  assert_eq!(server.hits.load(Ordering::SeqCst), 2);
  assert!(matches!(a.state(), QueryState::Fresh(_)));
  assert!(matches!(b.state(), QueryState::Fresh(_)));
}

#[tokio::test]
async fn test_expired_entry_is_swept_then_refetched() {
  let server = StubServer::start(place("Navat, renovated")).await;
  let (client, _kv) = client_for(&server.url);
  let key = ResourceKey::item(7);
  client.store().set(
    &key.cache_key(),
    CacheRecord::new(key.cache_key(), place("Navat"), Utc::now() - ChronoDuration::hours(25)),
  );

  let report = client.sweep_on_mount(&key).await.unwrap();
  assert_eq!(report.removed, 1);

  // After the sweep the screen starts cold
  let mut query = item_query(&client, &key);
  query.mount();
  assert!(query.is_loading());
  settle(&mut query).await;
  assert_eq!(
    query.data().map(|i| i.name.as_str()),
    Some("Navat, renovated")
  );
}

#[tokio::test]
async fn test_unknown_fields_survive_the_cache() {
  let server = StubServer::start(place("Navat")).await;
  let (client, _kv) = client_for(&server.url);
  let key = ResourceKey::item(7);

  client.refresh_item(&key).await.unwrap();
  let cached = client.cached_item(&key).unwrap().payload;
  assert_eq!(cached.extra.get("rating"), Some(&json!(4.5)));

  // A just-fetched entry survives the mount sweep
  let report = client.sweep_on_mount(&key).await.unwrap();
  assert_eq!(report.removed, 0);
  assert!(client.cached_item(&key).is_some());
}
