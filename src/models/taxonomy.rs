use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{optional_text, require_key, require_text, FieldErrors};

/// Stored species taxonomy row, keyed by its externally assigned species code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Taxonomy {
    pub species_code: String,
    pub common_name: String,
    pub scientific_name: String,
    pub category: String,
    pub family: String,
    pub species_group: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Taxonomy write payload as received from a client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaxonomy {
    pub species_code: Option<String>,
    pub common_name: Option<String>,
    pub scientific_name: Option<String>,
    pub category: Option<String>,
    pub family: Option<String>,
    pub species_group: Option<String>,
}

/// Validated taxonomy content, ready for the store
#[derive(Debug, Clone, PartialEq)]
pub struct TaxonomyDraft {
    pub species_code: String,
    pub common_name: String,
    pub scientific_name: String,
    pub category: String,
    pub family: String,
    pub species_group: Option<String>,
}

impl NewTaxonomy {
    pub fn into_draft(self) -> Result<TaxonomyDraft, FieldErrors> {
        let mut errors = FieldErrors::new();
        let draft = TaxonomyDraft {
            species_code: require_key(&mut errors, "speciesCode", self.species_code, 50),
            common_name: require_text(&mut errors, "commonName", self.common_name, 100),
            scientific_name: require_text(&mut errors, "scientificName", self.scientific_name, 100),
            category: require_text(&mut errors, "category", self.category, 50),
            family: require_text(&mut errors, "family", self.family, 50),
            species_group: optional_text(&mut errors, "speciesGroup", self.species_group, 50),
        };

        if errors.is_empty() {
            Ok(draft)
        } else {
            Err(errors)
        }
    }
}

impl TaxonomyDraft {
    pub fn into_taxonomy(self, created_at: DateTime<Utc>) -> Taxonomy {
        Taxonomy {
            species_code: self.species_code,
            common_name: self.common_name,
            scientific_name: self.scientific_name,
            category: self.category,
            family: self.family,
            species_group: self.species_group,
            created_at,
        }
    }
}
