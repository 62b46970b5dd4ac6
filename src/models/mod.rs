pub mod location;
pub mod observation;
pub mod taxonomy;

pub use location::{Location, LocationDraft, NewLocation};
pub use observation::{NewObservation, Observation, ObservationDraft};
pub use taxonomy::{NewTaxonomy, Taxonomy, TaxonomyDraft};

use std::collections::HashMap;

/// Field name -> problem description, reported back to the client as-is
pub type FieldErrors = HashMap<String, String>;

/// A required text field, kept exactly as sent. Missing, blank or too long values are errors.
pub(crate) fn require_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> String {
    match value {
        Some(v) if v.trim().is_empty() => {
            errors.insert(field.to_string(), "This field is required".to_string());
            v
        }
        Some(v) => {
            check_length(errors, field, &v, max_len);
            v
        }
        None => {
            errors.insert(field.to_string(), "This field is required".to_string());
            String::new()
        }
    }
}

/// A required lookup key. Surrounding whitespace is rejected rather than stripped,
/// so the stored key is always the one the caller will look it up by.
pub(crate) fn require_key(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> String {
    let key = require_text(errors, field, value, max_len);
    if !errors.contains_key(field) && key.trim() != key {
        errors.insert(
            field.to_string(),
            "Must not have leading or trailing whitespace".to_string(),
        );
    }
    key
}

/// Optional text, kept exactly as sent; length is still enforced
pub(crate) fn optional_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
    max_len: usize,
) -> Option<String> {
    let value = value?;
    check_length(errors, field, &value, max_len);
    Some(value)
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.chars().count() > max_len {
        errors.insert(
            field.to_string(),
            format!("Must be at most {} characters", max_len),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_text_keeps_value_and_flags_blank() {
        let mut errors = FieldErrors::new();
        assert_eq!(require_text(&mut errors, "name", Some(" Feeder ".into()), 10), " Feeder ");
        assert!(errors.is_empty());

        require_text(&mut errors, "name", Some("   ".into()), 10);
        require_text(&mut errors, "family", None, 10);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors["family"], "This field is required");
    }

    #[test]
    fn require_key_rejects_padding() {
        let mut errors = FieldErrors::new();
        assert_eq!(require_key(&mut errors, "speciesCode", Some("NORCAD".into()), 50), "NORCAD");
        assert!(errors.is_empty());

        require_key(&mut errors, "speciesCode", Some(" NORCAD ".into()), 50);
        assert_eq!(errors["speciesCode"], "Must not have leading or trailing whitespace");

        let mut errors = FieldErrors::new();
        require_key(&mut errors, "speciesCode", Some("  ".into()), 50);
        assert_eq!(errors["speciesCode"], "This field is required");
    }

    #[test]
    fn optional_text_enforces_length() {
        let mut errors = FieldErrors::new();
        assert_eq!(optional_text(&mut errors, "sex", Some("".into()), 20), Some(String::new()));
        assert_eq!(optional_text(&mut errors, "sex", None, 20), None);
        assert!(errors.is_empty());

        optional_text(&mut errors, "sex", Some("x".repeat(21)), 20);
        assert!(errors.contains_key("sex"));
    }
}
