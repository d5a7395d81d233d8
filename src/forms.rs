//! Serde helpers for CMS form bodies.
//!
//! The panels post what the edit dialogs hold: list fields typed as one
//! comma separated string, and optional fields left as empty strings.

use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use validator::ValidationError;

/// Field validator: required text must hold more than whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("is required"));
        return Err(err);
    }
    Ok(())
}

pub fn default_true() -> bool {
    true
}

/// Split a comma separated input into trimmed, non-empty items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListInput {
    Text(String),
    Items(Vec<String>),
}

/// Accept either `"a, b"` or `["a", "b"]`; `null` and missing become empty.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<ListInput>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(ListInput::Text(raw)) => split_list(&raw),
        Some(ListInput::Items(items)) => items
            .iter()
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Treat blank strings as absent.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Optional ISO date where a blank string means "no date".
pub fn blank_date<'de, D>(deserializer: D) -> Result<Option<chrono::NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_as_none(deserializer)? {
        None => Ok(None),
        Some(raw) => chrono::NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Form {
        #[serde(default, deserialize_with = "string_list")]
        technologies: Vec<String>,
        #[serde(default, deserialize_with = "blank_as_none")]
        icon: Option<String>,
        #[serde(default, deserialize_with = "blank_date")]
        end_date: Option<chrono::NaiveDate>,
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("Rust").is_ok());
        let err = not_blank("   ").unwrap_err();
        assert_eq!(err.code, "required");
    }

    #[test]
    fn test_split_list_trims_and_drops_empty() {
        assert_eq!(
            split_list(" Rust,  Axum ,,PostgreSQL, "),
            vec!["Rust", "Axum", "PostgreSQL"]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_string_list_accepts_text_or_array() {
        let text: Form = serde_json::from_str(r#"{"technologies": "React, Next.js"}"#).unwrap();
        assert_eq!(text.technologies, vec!["React", "Next.js"]);

        let array: Form =
            serde_json::from_str(r#"{"technologies": ["React", " ", "Next.js"]}"#).unwrap();
        assert_eq!(array.technologies, vec!["React", "Next.js"]);

        let missing: Form = serde_json::from_str("{}").unwrap();
        assert!(missing.technologies.is_empty());
    }

    #[test]
    fn test_blank_fields_become_none() {
        let form: Form = serde_json::from_str(r#"{"icon": "  ", "end_date": ""}"#).unwrap();
        assert!(form.icon.is_none());
        assert!(form.end_date.is_none());
    }

    #[test]
    fn test_blank_date_parses_iso_dates() {
        let form: Form = serde_json::from_str(r#"{"end_date": "2023-06-30"}"#).unwrap();
        assert_eq!(
            form.end_date,
            chrono::NaiveDate::from_ymd_opt(2023, 6, 30)
        );
        assert!(serde_json::from_str::<Form>(r#"{"end_date": "June"}"#).is_err());
    }
}
