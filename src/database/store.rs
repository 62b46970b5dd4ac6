//! Persistence contracts the services are built against.
//!
//! Every store hands back owned snapshots; nothing returned here aliases
//! storage state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::manager::DatabaseError;
use crate::models::{
    Location, LocationDraft, Observation, ObservationDraft, Taxonomy, TaxonomyDraft,
};

#[async_trait]
pub trait TaxonomyStore: Send + Sync {
    /// Insert or overwrite by species code. `created_at` is only used on insert;
    /// an overwrite keeps the stored value.
    async fn upsert(
        &self,
        draft: &TaxonomyDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Taxonomy, DatabaseError>;

    async fn get(&self, species_code: &str) -> Result<Option<Taxonomy>, DatabaseError>;

    async fn exists(&self, species_code: &str) -> Result<bool, DatabaseError>;

    async fn list(&self) -> Result<Vec<Taxonomy>, DatabaseError>;
}

#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Insert with a freshly generated id. Fails with `Conflict` on a duplicate name.
    async fn insert(
        &self,
        draft: &LocationDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Location, DatabaseError>;

    /// Overwrite an existing row, keeping its `created_at`.
    /// Fails with `NotFound` for an unknown id and `Conflict` on a duplicate name.
    async fn update(&self, id: i64, draft: &LocationDraft) -> Result<Location, DatabaseError>;

    async fn get(&self, id: i64) -> Result<Option<Location>, DatabaseError>;

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn list(&self) -> Result<Vec<Location>, DatabaseError>;
}

#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Check-and-insert as one atomic unit: both referenced rows must exist
    /// when the insert commits, otherwise `MissingReference` is returned and
    /// nothing is written. `now` becomes both `created_at` and `updated_at`.
    async fn insert_checked(
        &self,
        draft: &ObservationDraft,
        now: DateTime<Utc>,
    ) -> Result<Observation, DatabaseError>;

    async fn list(&self) -> Result<Vec<Observation>, DatabaseError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), DatabaseError>;
}
