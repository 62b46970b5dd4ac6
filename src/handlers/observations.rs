use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};

use crate::api::{ApiResponse, ApiResult, AppState};
use crate::models::{NewObservation, Observation};

/// POST /api/observations - Record an observation after checking its references
pub async fn create(
    Extension(state): Extension<AppState>,
    payload: Result<Json<Option<NewObservation>>, JsonRejection>,
) -> ApiResult<Observation> {
    let Json(observation) = payload?;
    let stored = state
        .observations
        .record_with_timeout(observation, state.request_timeout)
        .await?;
    Ok(ApiResponse::success(stored))
}

/// GET /api/observations - List all observations
pub async fn list(Extension(state): Extension<AppState>) -> ApiResult<Vec<Observation>> {
    let observations = state.observations.list_all().await?;
    Ok(ApiResponse::success(observations))
}
