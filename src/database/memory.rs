use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::database::manager::{DatabaseError, Reference};
use crate::database::store::{LocationStore, ObservationStore, StoreHealth, TaxonomyStore};
use crate::models::{
    Location, LocationDraft, Observation, ObservationDraft, Taxonomy, TaxonomyDraft,
};

#[derive(Debug, Default)]
struct Tables {
    taxonomy: BTreeMap<String, Taxonomy>,
    locations: BTreeMap<i64, Location>,
    observations: BTreeMap<i64, Observation>,
    last_location_id: i64,
    last_observation_id: i64,
}

/// In-process store. All tables share one lock, so a check-and-insert
/// observes and mutates a single consistent state.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    offline: AtomicBool,
    write_latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every write by `latency` before it touches the tables
    pub fn with_write_latency(latency: Duration) -> Self {
        Self {
            write_latency: Some(latency),
            ..Self::default()
        }
    }

    /// Simulate the storage backend going away (and coming back)
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), DatabaseError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(DatabaseError::Unavailable("memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }

    async fn before_write(&self) -> Result<(), DatabaseError> {
        if let Some(latency) = self.write_latency {
            tokio::time::sleep(latency).await;
        }
        self.check_online()
    }
}

impl Tables {
    fn name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.locations
            .values()
            .any(|l| l.name == name && Some(l.id) != except)
    }
}

#[async_trait]
impl TaxonomyStore for MemoryStore {
    async fn upsert(
        &self,
        draft: &TaxonomyDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Taxonomy, DatabaseError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;

        let created_at = tables
            .taxonomy
            .get(&draft.species_code)
            .map(|existing| existing.created_at)
            .unwrap_or(created_at);
        let row = draft.clone().into_taxonomy(created_at);
        tables.taxonomy.insert(row.species_code.clone(), row.clone());
        Ok(row)
    }

    async fn get(&self, species_code: &str) -> Result<Option<Taxonomy>, DatabaseError> {
        self.check_online()?;
        Ok(self.tables.read().await.taxonomy.get(species_code).cloned())
    }

    async fn exists(&self, species_code: &str) -> Result<bool, DatabaseError> {
        self.check_online()?;
        Ok(self.tables.read().await.taxonomy.contains_key(species_code))
    }

    async fn list(&self) -> Result<Vec<Taxonomy>, DatabaseError> {
        self.check_online()?;
        Ok(self.tables.read().await.taxonomy.values().cloned().collect())
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn insert(
        &self,
        draft: &LocationDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Location, DatabaseError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;

        if tables.name_taken(&draft.name, None) {
            return Err(DatabaseError::Conflict("location_name_key".to_string()));
        }

        tables.last_location_id += 1;
        let row = draft.clone().into_location(tables.last_location_id, created_at);
        tables.locations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update(&self, id: i64, draft: &LocationDraft) -> Result<Location, DatabaseError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;

        let created_at = match tables.locations.get(&id) {
            Some(existing) => existing.created_at,
            None => return Err(DatabaseError::NotFound(format!("location {}", id))),
        };
        if tables.name_taken(&draft.name, Some(id)) {
            return Err(DatabaseError::Conflict("location_name_key".to_string()));
        }

        let row = draft.clone().into_location(id, created_at);
        tables.locations.insert(id, row.clone());
        Ok(row)
    }

    async fn get(&self, id: i64) -> Result<Option<Location>, DatabaseError> {
        self.check_online()?;
        Ok(self.tables.read().await.locations.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        self.check_online()?;
        Ok(self.tables.read().await.locations.contains_key(&id))
    }

    async fn list(&self) -> Result<Vec<Location>, DatabaseError> {
        self.check_online()?;
        Ok(self.tables.read().await.locations.values().cloned().collect())
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn insert_checked(
        &self,
        draft: &ObservationDraft,
        now: DateTime<Utc>,
    ) -> Result<Observation, DatabaseError> {
        self.before_write().await?;
        let mut tables = self.tables.write().await;

        if !tables.taxonomy.contains_key(&draft.species_code) {
            return Err(DatabaseError::MissingReference(Reference::Species));
        }
        if !tables.locations.contains_key(&draft.location_id) {
            return Err(DatabaseError::MissingReference(Reference::Location));
        }

        tables.last_observation_id += 1;
        let row = draft.clone().into_observation(tables.last_observation_id, now);
        tables.observations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Observation>, DatabaseError> {
        self.check_online()?;
        Ok(self.tables.read().await.observations.values().cloned().collect())
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        self.check_online()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 14, hour, 0, 0).unwrap()
    }

    fn cardinal() -> TaxonomyDraft {
        TaxonomyDraft {
            species_code: "NORCAD".into(),
            common_name: "Northern Cardinal".into(),
            scientific_name: "Cardinalis cardinalis".into(),
            category: "species".into(),
            family: "Cardinalidae".into(),
            species_group: None,
        }
    }

    fn feeder(name: &str) -> LocationDraft {
        LocationDraft {
            name: name.into(),
            latitude: 43.65,
            longitude: -79.38,
            description: None,
            is_active: true,
        }
    }

    fn sighting(species_code: &str, location_id: i64) -> ObservationDraft {
        ObservationDraft {
            species_code: species_code.into(),
            location_id,
            weather_id: None,
            observation_date_time: at(7),
            count: 1,
            duration_minutes: None,
            sex: None,
            age: None,
            behavior: None,
            is_complete_checklist: false,
            notes: None,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_first_created_at() {
        let store = MemoryStore::new();
        let first = store.upsert(&cardinal(), at(8)).await.unwrap();

        let mut renamed = cardinal();
        renamed.common_name = "Cardinal".into();
        let second = store.upsert(&renamed, at(9)).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.common_name, "Cardinal");
        assert_eq!(TaxonomyStore::list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn location_ids_are_generated_and_names_unique() {
        let store = MemoryStore::new();
        let a = store.insert(&feeder("Backyard Feeder"), at(8)).await.unwrap();
        let b = store.insert(&feeder("Birdbath"), at(8)).await.unwrap();
        assert_ne!(a.id, b.id);

        let dup = store.insert(&feeder("Backyard Feeder"), at(9)).await;
        assert!(matches!(dup, Err(DatabaseError::Conflict(_))));

        let clash = store.update(b.id, &feeder("Backyard Feeder")).await;
        assert!(matches!(clash, Err(DatabaseError::Conflict(_))));

        let same = store.update(a.id, &feeder("Backyard Feeder")).await.unwrap();
        assert_eq!(same.created_at, a.created_at);
    }

    #[tokio::test]
    async fn update_unknown_location_is_not_found() {
        let store = MemoryStore::new();
        let result = store.update(42, &feeder("Pond")).await;
        assert!(matches!(result, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn insert_checked_rejects_dangling_references() {
        let store = MemoryStore::new();
        store.upsert(&cardinal(), at(8)).await.unwrap();
        let location = store.insert(&feeder("Backyard Feeder"), at(8)).await.unwrap();

        let missing_species = store.insert_checked(&sighting("UNKNOWN", location.id), at(9)).await;
        assert!(matches!(
            missing_species,
            Err(DatabaseError::MissingReference(Reference::Species))
        ));

        let missing_location = store.insert_checked(&sighting("NORCAD", 99), at(9)).await;
        assert!(matches!(
            missing_location,
            Err(DatabaseError::MissingReference(Reference::Location))
        ));

        assert!(ObservationStore::list(&store).await.unwrap().is_empty());

        let stored = store
            .insert_checked(&sighting("NORCAD", location.id), at(9))
            .await
            .unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.created_at, at(9));
        assert_eq!(stored.updated_at, at(9));
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        assert!(store.ping().await.unwrap_err().is_transient());
        assert!(TaxonomyStore::exists(&store, "NORCAD").await.unwrap_err().is_transient());

        store.set_offline(false);
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn write_latency_delays_writes() {
        let store = MemoryStore::with_write_latency(std::time::Duration::from_millis(50));
        let started = std::time::Instant::now();
        store.upsert(&cardinal(), at(8) + ChronoDuration::seconds(1)).await.unwrap();
        assert!(started.elapsed() >= std::time::Duration::from_millis(50));
    }
}
