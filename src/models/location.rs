use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{optional_text, require_text, FieldErrors};

/// Stored observation location; `name` is unique across all rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Location write payload. A present `id` targets that row when it exists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocation {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub is_active: bool,
}

impl NewLocation {
    pub fn into_draft(self) -> Result<LocationDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = require_text(&mut errors, "name", self.name, 255);
        let latitude = coordinate(&mut errors, "latitude", self.latitude, 90.0);
        let longitude = coordinate(&mut errors, "longitude", self.longitude, 180.0);
        let description = optional_text(&mut errors, "description", self.description, 1000);

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(LocationDraft {
            name,
            latitude,
            longitude,
            description,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

fn coordinate(errors: &mut FieldErrors, field: &str, value: Option<f64>, bound: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && (-bound..=bound).contains(&v) => v,
        Some(_) => {
            errors.insert(
                field.to_string(),
                format!("Must be between -{} and {}", bound, bound),
            );
            0.0
        }
        None => {
            errors.insert(field.to_string(), "This field is required".to_string());
            0.0
        }
    }
}

impl LocationDraft {
    pub fn into_location(self, id: i64, created_at: DateTime<Utc>) -> Location {
        Location {
            id,
            name: self.name,
            latitude: self.latitude,
            longitude: self.longitude,
            description: self.description,
            is_active: self.is_active,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_active() {
        let draft = NewLocation {
            name: Some("Backyard Feeder".into()),
            latitude: Some(43.65),
            longitude: Some(-79.38),
            ..Default::default()
        }
        .into_draft()
        .unwrap();

        assert!(draft.is_active);
        assert_eq!(draft.description, None);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let errors = NewLocation {
            name: Some("Pond".into()),
            latitude: Some(91.0),
            longitude: None,
            ..Default::default()
        }
        .into_draft()
        .unwrap_err();

        assert_eq!(errors["latitude"], "Must be between -90 and 90");
        assert_eq!(errors["longitude"], "This field is required");
    }
}
