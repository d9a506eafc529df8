//! Genre and language models
//!
//! Both are plain named records whose names are unique under
//! case-insensitive comparison.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::book::BookSummary;
use super::form::FieldSpec;

/// Book genre (e.g. Science Fiction, French Poetry)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

impl Genre {
    pub fn absolute_url(&self) -> String {
        format!("/catalog/genre/{}", self.id)
    }
}

/// Natural language a book is written in
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

impl Language {
    pub fn absolute_url(&self) -> String {
        format!("/catalog/language/{}", self.id)
    }
}

/// Genre with the books filed under it
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct GenreDetails {
    #[serde(flatten)]
    pub genre: Genre,
    pub books: Vec<BookSummary>,
}

/// Create/update payload shared by genres and languages
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NameForm {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
}

pub const GENRE_DUPLICATE_MESSAGE: &str = "Genre already exists (case insensitive match)";
pub const LANGUAGE_DUPLICATE_MESSAGE: &str = "Language already exists (case insensitive match)";

pub const GENRE_FIELDS: &[FieldSpec] = &[FieldSpec::text("name", "Name", 200)
    .with_help("Enter a book genre (e.g. Science Fiction, French Poetry etc.)")];

pub const LANGUAGE_FIELDS: &[FieldSpec] = &[FieldSpec::text("name", "Name", 200)
    .with_help("Enter the book's natural language (e.g. English, French, Japanese etc.)")];
