#![allow(dead_code)]

use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::process::{Child, Command};
use tower::ServiceExt;

use backyard_birds::api::{app, AppState};
use backyard_birds::clock::SystemClock;
use backyard_birds::config::{DatabaseConfig, StoreBackend};
use backyard_birds::database::{DatabaseManager, MemoryStore, PgStore};
use sqlx::PgPool;

/// Router over a fresh in-memory store
pub fn memory_app() -> Router {
    memory_app_with(Arc::new(MemoryStore::new()))
}

pub fn memory_app_with(store: Arc<MemoryStore>) -> Router {
    app(AppState::new(store, Arc::new(SystemClock), Duration::from_secs(5)))
}

/// Postgres store for the `DATABASE_URL` database, with the schema in place.
/// `None` when `DATABASE_URL` is unset, so callers can skip.
pub async fn pg_store() -> Option<(PgPool, Arc<PgStore>)> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL not set, skipping Postgres test");
            return None;
        }
    };

    let pool = DatabaseManager::connect(&pg_config(&url))
        .await
        .expect("connect to DATABASE_URL");
    let store = PgStore::new(pool.clone());
    store.ensure_schema().await.expect("ensure schema");
    Some((pool, Arc::new(store)))
}

pub fn pg_config(url: &str) -> DatabaseConfig {
    DatabaseConfig {
        backend: StoreBackend::Postgres,
        url: Some(url.to_string()),
        name: None,
        max_connections: 4,
        connection_timeout: 5,
        ensure_schema: true,
    }
}

/// Router over a Postgres store
pub fn pg_app(store: Arc<PgStore>) -> Router {
    app(AppState::new(store, Arc::new(SystemClock), Duration::from_secs(5)))
}

/// Key that will not collide with rows left behind by earlier runs
pub fn unique(prefix: &str) -> String {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    format!(
        "{}-{}-{}",
        prefix,
        chrono::Utc::now().timestamp_micros(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    )
}

/// Send a JSON request through the router and decode the JSON response
pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let raw = body.map(|b| b.to_string());
    send_raw(app, method, uri, raw.as_deref()).await
}

pub async fn send_raw(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(text) => {
            request = request.header("content-type", "application/json");
            Body::from(text.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

pub fn cardinal() -> Value {
    serde_json::json!({
        "speciesCode": "NORCAD",
        "commonName": "Northern Cardinal",
        "scientificName": "Cardinalis cardinalis",
        "category": "species",
        "family": "Cardinalidae",
        "speciesGroup": "Cardinals"
    })
}

pub fn backyard_feeder() -> Value {
    serde_json::json!({
        "name": "Backyard Feeder",
        "latitude": 43.6532,
        "longitude": -79.3832,
        "description": "Tube feeder by the fence"
    })
}

/// Server binary running against the memory backend on a free port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_backyard-birds"))
            .env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("BIND_ADDR", "127.0.0.1")
            .env("BIRDS_API_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
