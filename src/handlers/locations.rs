use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    Json,
};

use crate::api::{ApiResponse, ApiResult, AppState};
use crate::error::ApiError;
use crate::models::{Location, NewLocation};

/// POST /api/locations - Create a location, or update the one named by `id`
pub async fn create(
    Extension(state): Extension<AppState>,
    payload: Result<Json<Option<NewLocation>>, JsonRejection>,
) -> ApiResult<Location> {
    let Json(location) = payload?;
    let stored = state.locations.save(location).await?;
    Ok(ApiResponse::success(stored))
}

/// GET /api/locations/:id - Get a single location
pub async fn get(
    Extension(state): Extension<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Location> {
    let Path(id) = id.map_err(|e| ApiError::validation_error(e.body_text(), None))?;
    let location = state.locations.get(id).await?;
    Ok(ApiResponse::success(location))
}

/// GET /api/locations - List all locations
pub async fn list(Extension(state): Extension<AppState>) -> ApiResult<Vec<Location>> {
    let locations = state.locations.list().await?;
    Ok(ApiResponse::success(locations))
}
