use std::time::Duration;
use thiserror::Error;

use crate::database::{DatabaseError, Reference};
use crate::models::FieldErrors;

pub const SPECIES_NOT_FOUND: &str = "bird species not found";
pub const LOCATION_NOT_FOUND: &str = "location not found";
pub const TAXONOMY_NOT_FOUND: &str = "bird taxonomy not found";

/// Failures surfaced by the catalogs and the observation recorder.
///
/// Everything except `Unavailable` and `DeadlineExceeded` is a caller fault
/// and must not be retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },

    #[error("{0}")]
    Reference(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("deadline of {0:?} exceeded before the write committed")]
    DeadlineExceeded(Duration),

    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            fields: FieldErrors::new(),
        }
    }

    pub fn invalid_fields(fields: FieldErrors) -> Self {
        ServiceError::Validation {
            message: "Missing or invalid fields".to_string(),
            fields,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Unavailable(_) | ServiceError::DeadlineExceeded(_)
        )
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => ServiceError::NotFound(format!("{} not found", what)),
            DatabaseError::Conflict(constraint) => {
                ServiceError::Conflict(format!("unique constraint {} violated", constraint))
            }
            DatabaseError::MissingReference(Reference::Species) => {
                ServiceError::Reference(SPECIES_NOT_FOUND.to_string())
            }
            DatabaseError::MissingReference(Reference::Location) => {
                ServiceError::Reference(LOCATION_NOT_FOUND.to_string())
            }
            DatabaseError::Unavailable(msg) => ServiceError::Unavailable(msg),
            other => {
                tracing::error!("Storage error: {}", other);
                ServiceError::Storage(other.to_string())
            }
        }
    }
}
