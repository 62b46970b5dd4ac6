use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::database::{DatabaseError, LocationStore};
use crate::models::{Location, NewLocation};

use super::error::{ServiceError, LOCATION_NOT_FOUND};

/// Observation locations, keyed by a generated integer id. Names are unique.
pub struct LocationRegistry {
    store: Arc<dyn LocationStore>,
    clock: Arc<dyn Clock>,
}

impl LocationRegistry {
    pub fn new(store: Arc<dyn LocationStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Insert a new location, or overwrite the one named by `id`.
    ///
    /// An `id` with no matching row is saved as a new location with a generated id,
    /// so the name constraint still decides between success and conflict.
    pub async fn save(&self, location: Option<NewLocation>) -> Result<Location, ServiceError> {
        let location = location.ok_or_else(|| ServiceError::validation("location cannot be null"))?;
        let id = location.id;

        let draft = location.into_draft().map_err(|fields| {
            warn!("Rejected location write: {:?}", fields);
            ServiceError::invalid_fields(fields)
        })?;

        let result = match id {
            Some(id) => match self.store.update(id, &draft).await {
                Err(DatabaseError::NotFound(_)) => {
                    debug!("Location {} does not exist, inserting instead", id);
                    self.store.insert(&draft, self.clock.now()).await
                }
                other => other,
            },
            None => self.store.insert(&draft, self.clock.now()).await,
        };

        match result {
            Ok(stored) => {
                info!("Saved location {} ({})", stored.id, stored.name);
                Ok(stored)
            }
            Err(DatabaseError::Conflict(_)) => {
                warn!("Location name '{}' already in use", draft.name);
                Err(ServiceError::Conflict(format!(
                    "location name '{}' is already in use",
                    draft.name
                )))
            }
            Err(other) => Err(other.into()),
        }
    }

    pub async fn get(&self, id: i64) -> Result<Location, ServiceError> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(LOCATION_NOT_FOUND.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Location>, ServiceError> {
        Ok(self.store.list().await?)
    }

    pub async fn exists(&self, id: i64) -> Result<bool, ServiceError> {
        Ok(self.store.exists(id).await?)
    }
}
