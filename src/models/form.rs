//! Field declarations for the management forms and shared form-value parsing

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::user::Entity;

/// Kind of input a field expects
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Date,
    Choice,
    Reference,
    MultiReference,
}

/// Declarative description of one form field
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help_text: Option<&'static str>,
    pub choices: &'static [(&'static str, &'static str)],
}

impl FieldSpec {
    pub const fn text(name: &'static str, label: &'static str, max_length: usize) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            required: true,
            max_length: Some(max_length),
            help_text: None,
            choices: &[],
        }
    }

    pub const fn date(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Date,
            required: false,
            max_length: None,
            help_text: None,
            choices: &[],
        }
    }

    pub const fn reference(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Reference,
            required: false,
            max_length: None,
            help_text: None,
            choices: &[],
        }
    }

    pub const fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub const fn with_help(mut self, help_text: &'static str) -> Self {
        self.help_text = Some(help_text);
        self
    }

    pub const fn with_choices(mut self, choices: &'static [(&'static str, &'static str)]) -> Self {
        self.choices = choices;
        self
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Unbound form returned by the `create` endpoints
#[derive(Debug, Serialize)]
pub struct FormSchema {
    pub entity: &'static str,
    pub fields: &'static [FieldSpec],
    pub initial: serde_json::Value,
}

impl FormSchema {
    pub fn new(entity: Entity, fields: &'static [FieldSpec]) -> Self {
        Self {
            entity: entity.as_str(),
            fields,
            initial: serde_json::Value::Object(Default::default()),
        }
    }

    pub fn with_initial(mut self, initial: serde_json::Value) -> Self {
        self.initial = initial;
        self
    }
}

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_DATE_MESSAGE: &str = "Enter a valid date.";

/// Accepted date input formats: ISO first, then day/month/year
const DATE_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// Parse a submitted date value.
///
/// Returns `Ok(None)` for a blank value.
pub fn parse_form_date(raw: &str) -> Result<Option<NaiveDate>, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    DATE_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .map(Some)
        .ok_or(INVALID_DATE_MESSAGE)
}

/// Serde adapter for optional date fields submitted as JSON strings or form values
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_form_date(&raw).map_err(serde::de::Error::custom),
    }
}

/// Case-insensitive key used for uniqueness checks on names
pub fn normalized_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_form_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2023, 11, 11);
        assert_eq!(parse_form_date("2023-11-11"), Ok(expected));
        assert_eq!(parse_form_date("11/11/2023"), Ok(expected));
        assert_eq!(
            parse_form_date("05/01/2024"),
            Ok(NaiveDate::from_ymd_opt(2024, 1, 5))
        );
        assert_eq!(parse_form_date("  "), Ok(None));
        assert_eq!(parse_form_date("next tuesday"), Err(INVALID_DATE_MESSAGE));
        assert_eq!(parse_form_date("2023-02-30"), Err(INVALID_DATE_MESSAGE));
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(normalized_name("  Science Fiction "), "science fiction");
        assert_eq!(normalized_name("FANTASY"), normalized_name("fantasy"));
    }
}
