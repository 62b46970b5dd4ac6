use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::database::TaxonomyStore;
use crate::models::{NewTaxonomy, Taxonomy};

use super::error::{ServiceError, TAXONOMY_NOT_FOUND};

/// Species taxonomy records, keyed by species code
pub struct TaxonomyCatalog {
    store: Arc<dyn TaxonomyStore>,
    clock: Arc<dyn Clock>,
}

impl TaxonomyCatalog {
    pub fn new(store: Arc<dyn TaxonomyStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Insert or overwrite a taxonomy row. `createdAt` is stamped on first insert only.
    pub async fn save(&self, taxonomy: Option<NewTaxonomy>) -> Result<Taxonomy, ServiceError> {
        let taxonomy =
            taxonomy.ok_or_else(|| ServiceError::validation("bird taxonomy cannot be null"))?;

        let draft = taxonomy.into_draft().map_err(|fields| {
            warn!("Rejected taxonomy write: {:?}", fields);
            ServiceError::invalid_fields(fields)
        })?;

        let stored = self.store.upsert(&draft, self.clock.now()).await?;
        info!("Saved taxonomy {}", stored.species_code);
        Ok(stored)
    }

    pub async fn get(&self, species_code: &str) -> Result<Taxonomy, ServiceError> {
        self.store
            .get(species_code)
            .await?
            .ok_or_else(|| ServiceError::NotFound(TAXONOMY_NOT_FOUND.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Taxonomy>, ServiceError> {
        Ok(self.store.list().await?)
    }

    pub async fn exists(&self, species_code: &str) -> Result<bool, ServiceError> {
        Ok(self.store.exists(species_code).await?)
    }
}
