use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{optional_text, FieldErrors};

/// Stored bird observation. `created_at` never changes; `updated_at >= created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: i64,
    pub species_code: String,
    pub location_id: i64,
    pub weather_id: Option<i64>,
    #[sqlx(rename = "observation_datetime")]
    pub observation_date_time: DateTime<Utc>,
    pub count: i32,
    pub duration_minutes: Option<i32>,
    pub sex: Option<String>,
    pub age: Option<String>,
    pub behavior: Option<String>,
    pub is_complete_checklist: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Observation payload as submitted by a caller.
///
/// `species_code` and `location_id` are resolved against their catalogs by the
/// recorder before the remaining fields are validated. `weather_id` is carried
/// through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewObservation {
    pub species_code: Option<String>,
    pub location_id: Option<i64>,
    pub weather_id: Option<i64>,
    pub observation_date_time: Option<DateTime<Utc>>,
    pub count: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub sex: Option<String>,
    pub age: Option<String>,
    pub behavior: Option<String>,
    pub is_complete_checklist: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationDraft {
    pub species_code: String,
    pub location_id: i64,
    pub weather_id: Option<i64>,
    pub observation_date_time: DateTime<Utc>,
    pub count: i32,
    pub duration_minutes: Option<i32>,
    pub sex: Option<String>,
    pub age: Option<String>,
    pub behavior: Option<String>,
    pub is_complete_checklist: bool,
    pub notes: Option<String>,
}

impl NewObservation {
    /// Validate the non-reference fields, pairing them with already-resolved references
    pub fn into_draft(
        self,
        species_code: String,
        location_id: i64,
    ) -> Result<ObservationDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let observation_date_time = self.observation_date_time;
        if observation_date_time.is_none() {
            errors.insert(
                "observationDateTime".to_string(),
                "This field is required".to_string(),
            );
        }

        let count = match self.count {
            Some(c) if c >= 0 => c,
            Some(_) => {
                errors.insert("count".to_string(), "Must not be negative".to_string());
                0
            }
            None => {
                errors.insert("count".to_string(), "This field is required".to_string());
                0
            }
        };

        if matches!(self.duration_minutes, Some(d) if d < 0) {
            errors.insert(
                "durationMinutes".to_string(),
                "Must not be negative".to_string(),
            );
        }

        let sex = optional_text(&mut errors, "sex", self.sex, 20);
        let age = optional_text(&mut errors, "age", self.age, 20);
        let behavior = optional_text(&mut errors, "behavior", self.behavior, 1000);
        let notes = optional_text(&mut errors, "notes", self.notes, 4000);

        match observation_date_time {
            Some(observation_date_time) if errors.is_empty() => Ok(ObservationDraft {
                species_code,
                location_id,
                weather_id: self.weather_id,
                observation_date_time,
                count,
                duration_minutes: self.duration_minutes,
                sex,
                age,
                behavior,
                is_complete_checklist: self.is_complete_checklist.unwrap_or(false),
                notes,
            }),
            _ => Err(errors),
        }
    }
}

impl ObservationDraft {
    /// Materialize a stored row; both timestamps start out equal
    pub fn into_observation(self, id: i64, now: DateTime<Utc>) -> Observation {
        Observation {
            id,
            species_code: self.species_code,
            location_id: self.location_id,
            weather_id: self.weather_id,
            observation_date_time: self.observation_date_time,
            count: self.count,
            duration_minutes: self.duration_minutes,
            sex: self.sex,
            age: self.age,
            behavior: self.behavior,
            is_complete_checklist: self.is_complete_checklist,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_rfc3339_observation_time() {
        let input: NewObservation = serde_json::from_value(json!({
            "speciesCode": "NORCAD",
            "locationId": 1,
            "observationDateTime": "2024-01-14T08:30:00Z",
            "count": 2,
            "weatherId": 77
        }))
        .unwrap();

        let draft = input.into_draft("NORCAD".into(), 1).unwrap();
        assert_eq!(draft.count, 2);
        assert_eq!(draft.weather_id, Some(77));
        assert!(!draft.is_complete_checklist);
        assert_eq!(draft.observation_date_time.to_rfc3339(), "2024-01-14T08:30:00+00:00");
    }

    #[test]
    fn requires_count_and_time() {
        let errors = NewObservation::default()
            .into_draft("NORCAD".into(), 1)
            .unwrap_err();

        assert_eq!(errors["count"], "This field is required");
        assert_eq!(errors["observationDateTime"], "This field is required");
    }

    #[test]
    fn rejects_negative_count() {
        let errors = NewObservation {
            observation_date_time: Some(Utc::now()),
            count: Some(-1),
            ..Default::default()
        }
        .into_draft("NORCAD".into(), 1)
        .unwrap_err();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors["count"], "Must not be negative");
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let now = Utc::now();
        let draft = NewObservation {
            observation_date_time: Some(now),
            count: Some(1),
            ..Default::default()
        }
        .into_draft("BLUJAY".into(), 3)
        .unwrap();

        let value = serde_json::to_value(draft.into_observation(9, now)).unwrap();
        assert_eq!(value["speciesCode"], "BLUJAY");
        assert_eq!(value["locationId"], 3);
        assert_eq!(value["isCompleteChecklist"], false);
        assert_eq!(value["createdAt"], value["updatedAt"]);
    }
}
