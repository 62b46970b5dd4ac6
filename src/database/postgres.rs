use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::database::manager::{DatabaseError, Reference};
use crate::database::store::{LocationStore, ObservationStore, StoreHealth, TaxonomyStore};
use crate::models::{
    Location, LocationDraft, Observation, ObservationDraft, Taxonomy, TaxonomyDraft,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Table definitions. The observation foreign keys back up the transactional
/// check in `insert_checked`; `weather_id` is intentionally unconstrained.
const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS bird_taxonomy (
        species_code    VARCHAR(50) PRIMARY KEY,
        common_name     VARCHAR(100) NOT NULL,
        scientific_name VARCHAR(100) NOT NULL,
        category        VARCHAR(50) NOT NULL,
        family          VARCHAR(50) NOT NULL,
        species_group   VARCHAR(50),
        created_at      TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS location (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(255) NOT NULL CONSTRAINT location_name_key UNIQUE,
        latitude    DOUBLE PRECISION NOT NULL,
        longitude   DOUBLE PRECISION NOT NULL,
        description TEXT,
        is_active   BOOLEAN NOT NULL DEFAULT TRUE,
        created_at  TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS weather (
        id             BIGSERIAL PRIMARY KEY,
        temperature    DOUBLE PRECISION NOT NULL,
        precipitation  DOUBLE PRECISION,
        wind_speed     INTEGER,
        wind_direction VARCHAR(20),
        conditions     TEXT,
        humidity       INTEGER,
        recorded_at    TIMESTAMPTZ NOT NULL,
        created_at     TIMESTAMPTZ NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS bird_observation (
        id                    BIGSERIAL PRIMARY KEY,
        species_code          VARCHAR(50) NOT NULL
            CONSTRAINT bird_observation_species_fkey REFERENCES bird_taxonomy (species_code),
        location_id           BIGINT NOT NULL
            CONSTRAINT bird_observation_location_fkey REFERENCES location (id),
        weather_id            BIGINT,
        observation_datetime  TIMESTAMPTZ NOT NULL,
        count                 INTEGER NOT NULL,
        duration_minutes      INTEGER,
        sex                   VARCHAR(20),
        age                   VARCHAR(20),
        behavior              TEXT,
        is_complete_checklist BOOLEAN NOT NULL DEFAULT FALSE,
        notes                 TEXT,
        created_at            TIMESTAMPTZ NOT NULL,
        updated_at            TIMESTAMPTZ NOT NULL,
        CHECK (updated_at >= created_at)
    )"#,
];

const TAXONOMY_COLUMNS: &str =
    "species_code, common_name, scientific_name, category, family, species_group, created_at";
const LOCATION_COLUMNS: &str =
    "id, name, latitude, longitude, description, is_active, created_at";
const OBSERVATION_COLUMNS: &str = "id, species_code, location_id, weather_id, observation_datetime, \
     count, duration_minutes, sex, age, behavior, is_complete_checklist, notes, created_at, updated_at";

/// Postgres-backed store for all three entity types
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create any missing tables. Existing tables are left alone.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)?;
        }
        info!("Database schema verified ({} tables)", SCHEMA.len());
        Ok(())
    }
}

/// Translate driver errors into the storage error categories the services understand
pub(crate) fn map_sqlx(err: sqlx::Error) -> DatabaseError {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint().unwrap_or_default().to_string();
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return DatabaseError::Conflict(constraint),
            Some(FOREIGN_KEY_VIOLATION) => {
                let reference = if constraint.contains("location") {
                    Reference::Location
                } else {
                    Reference::Species
                };
                return DatabaseError::MissingReference(reference);
            }
            _ => {}
        }
    }

    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => DatabaseError::Unavailable(err.to_string()),
        other => DatabaseError::Sqlx(other),
    }
}

#[async_trait]
impl TaxonomyStore for PgStore {
    async fn upsert(
        &self,
        draft: &TaxonomyDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Taxonomy, DatabaseError> {
        let sql = format!(
            "INSERT INTO bird_taxonomy ({TAXONOMY_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (species_code) DO UPDATE SET \
                common_name = EXCLUDED.common_name, \
                scientific_name = EXCLUDED.scientific_name, \
                category = EXCLUDED.category, \
                family = EXCLUDED.family, \
                species_group = EXCLUDED.species_group \
             RETURNING {TAXONOMY_COLUMNS}"
        );

        sqlx::query_as::<_, Taxonomy>(&sql)
            .bind(&draft.species_code)
            .bind(&draft.common_name)
            .bind(&draft.scientific_name)
            .bind(&draft.category)
            .bind(&draft.family)
            .bind(&draft.species_group)
            .bind(created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn get(&self, species_code: &str) -> Result<Option<Taxonomy>, DatabaseError> {
        let sql = format!("SELECT {TAXONOMY_COLUMNS} FROM bird_taxonomy WHERE species_code = $1");
        sqlx::query_as::<_, Taxonomy>(&sql)
            .bind(species_code)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn exists(&self, species_code: &str) -> Result<bool, DatabaseError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM bird_taxonomy WHERE species_code = $1)",
        )
        .bind(species_code)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx)
    }

    async fn list(&self) -> Result<Vec<Taxonomy>, DatabaseError> {
        let sql = format!("SELECT {TAXONOMY_COLUMNS} FROM bird_taxonomy ORDER BY species_code");
        sqlx::query_as::<_, Taxonomy>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }
}

#[async_trait]
impl LocationStore for PgStore {
    async fn insert(
        &self,
        draft: &LocationDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Location, DatabaseError> {
        let sql = format!(
            "INSERT INTO location (name, latitude, longitude, description, is_active, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {LOCATION_COLUMNS}"
        );

        sqlx::query_as::<_, Location>(&sql)
            .bind(&draft.name)
            .bind(draft.latitude)
            .bind(draft.longitude)
            .bind(&draft.description)
            .bind(draft.is_active)
            .bind(created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn update(&self, id: i64, draft: &LocationDraft) -> Result<Location, DatabaseError> {
        let sql = format!(
            "UPDATE location SET name = $2, latitude = $3, longitude = $4, description = $5, \
             is_active = $6 WHERE id = $1 RETURNING {LOCATION_COLUMNS}"
        );

        sqlx::query_as::<_, Location>(&sql)
            .bind(id)
            .bind(&draft.name)
            .bind(draft.latitude)
            .bind(draft.longitude)
            .bind(&draft.description)
            .bind(draft.is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?
            .ok_or_else(|| DatabaseError::NotFound(format!("location {}", id)))
    }

    async fn get(&self, id: i64) -> Result<Option<Location>, DatabaseError> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM location WHERE id = $1");
        sqlx::query_as::<_, Location>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM location WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)
    }

    async fn list(&self) -> Result<Vec<Location>, DatabaseError> {
        let sql = format!("SELECT {LOCATION_COLUMNS} FROM location ORDER BY id");
        sqlx::query_as::<_, Location>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }
}

#[async_trait]
impl ObservationStore for PgStore {
    async fn insert_checked(
        &self,
        draft: &ObservationDraft,
        now: DateTime<Utc>,
    ) -> Result<Observation, DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        // FOR KEY SHARE blocks deletes and key updates of the referenced rows until commit.
        // Returning early drops `tx`, which rolls back.
        let species = sqlx::query_scalar::<_, String>(
            "SELECT species_code FROM bird_taxonomy WHERE species_code = $1 FOR KEY SHARE",
        )
        .bind(&draft.species_code)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        if species.is_none() {
            return Err(DatabaseError::MissingReference(Reference::Species));
        }

        let location = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM location WHERE id = $1 FOR KEY SHARE",
        )
        .bind(draft.location_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx)?;
        if location.is_none() {
            return Err(DatabaseError::MissingReference(Reference::Location));
        }

        let sql = format!(
            "INSERT INTO bird_observation (species_code, location_id, weather_id, observation_datetime, \
             count, duration_minutes, sex, age, behavior, is_complete_checklist, notes, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) \
             RETURNING {OBSERVATION_COLUMNS}"
        );

        let stored = sqlx::query_as::<_, Observation>(&sql)
            .bind(&draft.species_code)
            .bind(draft.location_id)
            .bind(draft.weather_id)
            .bind(draft.observation_date_time)
            .bind(draft.count)
            .bind(draft.duration_minutes)
            .bind(&draft.sex)
            .bind(&draft.age)
            .bind(&draft.behavior)
            .bind(draft.is_complete_checklist)
            .bind(&draft.notes)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        tx.commit().await.map_err(map_sqlx)?;
        debug!("Committed observation {}", stored.id);
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Observation>, DatabaseError> {
        let sql = format!("SELECT {OBSERVATION_COLUMNS} FROM bird_observation ORDER BY id");
        sqlx::query_as::<_, Observation>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(map_sqlx(sqlx::Error::PoolTimedOut).is_transient());
        assert!(map_sqlx(sqlx::Error::PoolClosed).is_transient());
    }

    #[test]
    fn configuration_errors_are_not_transient() {
        let err = map_sqlx(sqlx::Error::Configuration("unknown sslmode".into()));
        assert!(matches!(err, DatabaseError::Sqlx(sqlx::Error::Configuration(_))));
        assert!(!err.is_transient());
    }

    #[test]
    fn row_not_found_is_not_transient() {
        let err = map_sqlx(sqlx::Error::RowNotFound);
        assert!(matches!(err, DatabaseError::Sqlx(sqlx::Error::RowNotFound)));
        assert!(!err.is_transient());
    }

    #[test]
    fn schema_declares_observation_foreign_keys() {
        let observation = SCHEMA
            .iter()
            .find(|s| s.contains("bird_observation ("))
            .unwrap();
        assert!(observation.contains("REFERENCES bird_taxonomy (species_code)"));
        assert!(observation.contains("REFERENCES location (id)"));
        assert!(!observation.contains("REFERENCES weather"));
    }

    /// Raw driver errors from a live database, when DATABASE_URL is set
    async fn live_pool() -> Option<PgPool> {
        let url = std::env::var("DATABASE_URL").ok()?;
        let pool = PgPool::connect(&url).await.ok()?;
        PgStore::new(pool.clone()).ensure_schema().await.ok()?;
        Some(pool)
    }

    #[tokio::test]
    async fn maps_live_constraint_violations() {
        let Some(pool) = live_pool().await else { return };
        let suffix = Utc::now().timestamp_micros();

        let orphan = sqlx::query(
            "INSERT INTO bird_observation (species_code, location_id, observation_datetime, count, \
             created_at, updated_at) VALUES ($1, $2, now(), 1, now(), now())",
        )
        .bind(format!("ORPHAN-{}", suffix))
        .bind(i64::MAX)
        .execute(&pool)
        .await
        .unwrap_err();
        assert!(matches!(map_sqlx(orphan), DatabaseError::MissingReference(_)));

        let name = format!("Mapping Feeder {}", suffix);
        let insert = "INSERT INTO location (name, latitude, longitude, created_at) \
                      VALUES ($1, 0, 0, now())";
        sqlx::query(insert).bind(&name).execute(&pool).await.unwrap();
        let duplicate = sqlx::query(insert).bind(&name).execute(&pool).await.unwrap_err();
        match map_sqlx(duplicate) {
            DatabaseError::Conflict(constraint) => assert_eq!(constraint, "location_name_key"),
            other => panic!("expected conflict, got {:?}", other),
        }
    }
}
