pub mod response;

pub use response::{ApiResponse, ApiResult};

use axum::{routing::get, Extension, Router};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::database::{LocationStore, ObservationStore, StoreHealth, TaxonomyStore};
use crate::handlers;
use crate::services::{LocationRegistry, ObservationRecorder, TaxonomyCatalog};

/// Shared per-process handles, injected into handlers as an `Extension`
#[derive(Clone)]
pub struct AppState {
    pub taxonomy: Arc<TaxonomyCatalog>,
    pub locations: Arc<LocationRegistry>,
    pub observations: Arc<ObservationRecorder>,
    pub health: Arc<dyn StoreHealth>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wire all three components against one store and one clock
    pub fn new<S>(store: Arc<S>, clock: Arc<dyn Clock>, request_timeout: Duration) -> Self
    where
        S: TaxonomyStore + LocationStore + ObservationStore + StoreHealth + 'static,
    {
        let taxonomy = Arc::new(TaxonomyCatalog::new(store.clone(), clock.clone()));
        let locations = Arc::new(LocationRegistry::new(store.clone(), clock.clone()));
        let observations = Arc::new(ObservationRecorder::new(
            taxonomy.clone(),
            locations.clone(),
            store.clone(),
            clock,
        ));

        Self {
            taxonomy,
            locations,
            observations,
            health: store,
            request_timeout,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .merge(taxonomy_routes())
        .merge(location_routes())
        .merge(observation_routes())
        .layer(Extension(state))
}

fn taxonomy_routes() -> Router {
    use handlers::taxonomy;

    Router::new()
        .route("/api/taxonomy", get(taxonomy::list).post(taxonomy::create))
        .route("/api/taxonomy/:species_code", get(taxonomy::get))
}

fn location_routes() -> Router {
    use handlers::locations;

    Router::new()
        .route("/api/locations", get(locations::list).post(locations::create))
        .route("/api/locations/:id", get(locations::get))
}

fn observation_routes() -> Router {
    use handlers::observations;

    // No date-range query route: its bounds and timezone semantics are undecided.
    Router::new().route(
        "/api/observations",
        get(observations::list).post(observations::create),
    )
}
