use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    Json,
};

use crate::api::{ApiResponse, ApiResult, AppState};
use crate::models::{NewTaxonomy, Taxonomy};

/// POST /api/taxonomy - Insert or overwrite a species by code
pub async fn create(
    Extension(state): Extension<AppState>,
    payload: Result<Json<Option<NewTaxonomy>>, JsonRejection>,
) -> ApiResult<Taxonomy> {
    let Json(taxonomy) = payload?;
    let stored = state.taxonomy.save(taxonomy).await?;
    Ok(ApiResponse::success(stored))
}

/// GET /api/taxonomy/:species_code - Get a single species
pub async fn get(
    Extension(state): Extension<AppState>,
    Path(species_code): Path<String>,
) -> ApiResult<Taxonomy> {
    let taxonomy = state.taxonomy.get(&species_code).await?;
    Ok(ApiResponse::success(taxonomy))
}

/// GET /api/taxonomy - List all species
pub async fn list(Extension(state): Extension<AppState>) -> ApiResult<Vec<Taxonomy>> {
    let taxonomies = state.taxonomy.list().await?;
    Ok(ApiResponse::success(taxonomies))
}
