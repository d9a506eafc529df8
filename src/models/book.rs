//! Book model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::author::Author;
use super::book_instance::BookInstanceView;
use super::form::{FieldKind, FieldSpec};
use super::genre::{Genre, Language};

/// Book record (a title, not a physical copy)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: Option<i32>,
    pub summary: String,
    pub isbn: String,
    pub language_id: Option<i32>,
}

impl Book {
    pub fn absolute_url(&self) -> String {
        format!("/catalog/book/{}", self.id)
    }
}

/// Book row used by listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    /// "Last, First" of the author when set
    pub author_name: Option<String>,
}

/// Book with its author, language, genres, and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    pub book: Book,
    pub author: Option<Author>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub copies: Vec<BookInstanceView>,
}

/// Names of the first three genres, comma separated
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(3)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Create/update book payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    pub author_id: Option<i32>,
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1 to 1000 characters"))]
    pub summary: String,
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1 to 13 characters"))]
    pub isbn: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Select at least one genre"))]
    pub genre_ids: Vec<i32>,
    pub language_id: Option<i32>,
}

pub const ISBN_DUPLICATE_MESSAGE: &str = "Book with this ISBN already exists";

pub const BOOK_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("title", "Title", 200),
    FieldSpec::reference("author_id", "Author"),
    FieldSpec::text("summary", "Summary", 1000)
        .with_kind(FieldKind::TextArea)
        .with_help("Enter a brief description of the book"),
    FieldSpec::text("isbn", "ISBN", 13).with_help("13 Character ISBN number"),
    FieldSpec::reference("genre_ids", "Genre")
        .with_kind(FieldKind::MultiReference)
        .with_help("Select a genre for this book")
        .required(),
    FieldSpec::reference("language_id", "Language"),
];
