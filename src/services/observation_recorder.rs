//! Reference-checked observation writes.
//!
//! `record` resolves the species and location references through their
//! catalogs, validates the remaining fields, then hands the draft to
//! `ObservationStore::insert_checked`, which repeats the reference check and
//! the insert as one atomic unit. The catalog checks give the caller a precise
//! error without opening a write; the store check closes the window between
//! that read and the insert. The weather reference is stored unchecked.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::database::ObservationStore;
use crate::models::{NewObservation, Observation};

use super::error::{ServiceError, LOCATION_NOT_FOUND, SPECIES_NOT_FOUND};
use super::location_registry::LocationRegistry;
use super::taxonomy_catalog::TaxonomyCatalog;

pub struct ObservationRecorder {
    taxonomy: Arc<TaxonomyCatalog>,
    locations: Arc<LocationRegistry>,
    store: Arc<dyn ObservationStore>,
    clock: Arc<dyn Clock>,
}

impl ObservationRecorder {
    pub fn new(
        taxonomy: Arc<TaxonomyCatalog>,
        locations: Arc<LocationRegistry>,
        store: Arc<dyn ObservationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            taxonomy,
            locations,
            store,
            clock,
        }
    }

    pub async fn record(
        &self,
        observation: Option<NewObservation>,
    ) -> Result<Observation, ServiceError> {
        let mut observation = observation
            .ok_or_else(|| ServiceError::validation("bird observation cannot be null"))?;

        let species_code = match observation.species_code.take() {
            Some(code) if self.taxonomy.exists(&code).await? => code,
            code => {
                warn!("Rejected observation: unknown species {:?}", code);
                return Err(ServiceError::Reference(SPECIES_NOT_FOUND.to_string()));
            }
        };

        let location_id = match observation.location_id {
            Some(id) if self.locations.exists(id).await? => id,
            id => {
                warn!("Rejected observation: unknown location {:?}", id);
                return Err(ServiceError::Reference(LOCATION_NOT_FOUND.to_string()));
            }
        };

        let draft = observation
            .into_draft(species_code, location_id)
            .map_err(|fields| {
                warn!("Rejected observation: {:?}", fields);
                ServiceError::invalid_fields(fields)
            })?;

        let stored = self.store.insert_checked(&draft, self.clock.now()).await?;
        info!(
            "Recorded observation {} ({} x{} at location {})",
            stored.id, stored.species_code, stored.count, stored.location_id
        );
        Ok(stored)
    }

    /// `record` bounded by a caller deadline. On expiry the in-flight write is
    /// dropped before it commits and `DeadlineExceeded` is returned.
    pub async fn record_with_timeout(
        &self,
        observation: Option<NewObservation>,
        deadline: Duration,
    ) -> Result<Observation, ServiceError> {
        match tokio::time::timeout(deadline, self.record(observation)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Observation write abandoned after {:?}", deadline);
                Err(ServiceError::DeadlineExceeded(deadline))
            }
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Observation>, ServiceError> {
        Ok(self.store.list().await?)
    }
}
