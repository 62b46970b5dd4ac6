use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::api::AppState;

/// GET / - Service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Backyard Birds API",
            "version": version,
            "description": "Bird observations checked against a species taxonomy and known locations",
            "endpoints": {
                "health": "/health",
                "taxonomy": "/api/taxonomy[/:species_code]",
                "locations": "/api/locations[/:id]",
                "observations": "/api/observations",
            }
        }
    }))
}

/// GET /health - Storage reachability
pub async fn health(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.health.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "storage": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "storage unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "storage_error": e.to_string()
                    }
                })),
            )
        }
    }
}
