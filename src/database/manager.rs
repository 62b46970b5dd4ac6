use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::postgres::map_sqlx;

/// Which cross-entity reference a write depended on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Species,
    Location,
}

/// Errors from the persistence layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Referenced {0:?} row does not exist")]
    MissingReference(Reference),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Only connectivity failures are worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, DatabaseError::Unavailable(_))
    }
}

/// Builds the Postgres connection pool from configuration
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string =
            Self::build_connection_string(config.url.as_deref(), config.name.as_deref())?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await
            .map_err(map_sqlx)?;

        info!(
            "Created database pool (max_connections={})",
            config.max_connections
        );
        Ok(pool)
    }

    /// Resolve the connection string, optionally swapping the database name in the URL path
    fn build_connection_string(
        base: Option<&str>,
        database_name: Option<&str>,
    ) -> Result<String, DatabaseError> {
        let base = base.ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        let mut url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        if let Some(name) = database_name {
            if !Self::is_valid_db_name(name) {
                return Err(DatabaseError::InvalidDatabaseUrl);
            }
            url.set_path(&format!("/{}", name));
        }
        Ok(url.into())
    }

    fn is_valid_db_name(name: &str) -> bool {
        !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}
