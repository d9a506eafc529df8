//! Author model and related types

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookSummary;
use super::form::{optional_date, FieldSpec};

/// Full author model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    /// Labelled "died" in forms
    pub date_of_death: Option<NaiveDate>,
}

impl Author {
    pub fn absolute_url(&self) -> String {
        format!("/catalog/author/{}", self.id)
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

/// Author with the books they wrote
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    #[serde(flatten)]
    pub author: Author,
    pub display_name: String,
    pub books: Vec<BookSummary>,
}

/// Create/update author payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AuthorForm {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,
    #[serde(default, deserialize_with = "optional_date")]
    #[schema(value_type = Option<String>, example = "1920-01-02")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, deserialize_with = "optional_date")]
    #[schema(value_type = Option<String>, example = "11/11/2023")]
    pub date_of_death: Option<NaiveDate>,
}

pub const AUTHOR_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("first_name", "First name", 100),
    FieldSpec::text("last_name", "Last name", 100),
    FieldSpec::date("date_of_birth", "Date of birth"),
    FieldSpec::date("date_of_death", "Died"),
];

/// Initial value of the "died" field on a blank author form
pub const AUTHOR_INITIAL_DATE_OF_DEATH: &str = "11/11/2023";
