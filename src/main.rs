use anyhow::Context;
use axum::http::HeaderValue;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use backyard_birds::api::{app, AppState};
use backyard_birds::clock::SystemClock;
use backyard_birds::config::{config, AppConfig, SecurityConfig, StoreBackend};
use backyard_birds::database::{DatabaseManager, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, STORE_BACKEND, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config();
    tracing::info!(
        "Starting Backyard Birds API in {:?} mode ({:?} store)",
        config.environment,
        config.database.backend
    );

    let state = build_state(config).await?;

    let mut router = app(state);
    if config.server.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if let Some(cors) = cors_layer(&config.security) {
        router = router.layer(cors);
    }

    let bind_addr = config.server.listen_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Backyard Birds API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn build_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let clock = Arc::new(SystemClock);
    let timeout = config.server.request_timeout();

    match config.database.backend {
        StoreBackend::Memory => Ok(AppState::new(Arc::new(MemoryStore::new()), clock, timeout)),
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to Postgres")?;
            let store = PgStore::new(pool);
            if config.database.ensure_schema {
                store.ensure_schema().await.context("failed to prepare schema")?;
            }
            Ok(AppState::new(Arc::new(store), clock, timeout))
        }
    }
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }
    if security.cors_origins.is_empty() {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
