//! Book instance (physical copy) model and related types

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::form::{optional_date, FieldKind, FieldSpec};
use super::user::UserShort;

/// Loan status of a copy, stored as a one-letter code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[default]
    #[serde(rename = "d")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    pub fn code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "d",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "d" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.code(), buf)
    }
}

/// Full copy model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: Option<i32>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
}

impl BookInstance {
    /// A fresh copy with a random identifier and the default status
    pub fn new(book_id: Option<i32>, imprint: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            book_id,
            imprint: imprint.into(),
            due_back: None,
            borrower_id: None,
            status: LoanStatus::default(),
        }
    }

    /// Due back before `today`. Never stored.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.due_back, Some(due_back) if today > due_back)
    }

    pub fn absolute_url(&self) -> String {
        format!("/catalog/bookinstance/{}", self.id)
    }
}

/// Copy joined with its book title and borrower
#[derive(Debug, Clone, FromRow)]
pub struct BookInstanceRow {
    #[sqlx(flatten)]
    pub instance: BookInstance,
    pub book_title: Option<String>,
    pub borrower_username: Option<String>,
}

impl BookInstanceRow {
    pub fn into_view(self, today: NaiveDate) -> BookInstanceView {
        let is_overdue = self.instance.is_overdue(today);
        let borrower = match (self.instance.borrower_id, self.borrower_username) {
            (Some(id), Some(username)) => Some(UserShort { id, username }),
            _ => None,
        };
        BookInstanceView {
            display_name: format!(
                "{} ({})",
                self.instance.id,
                self.book_title.as_deref().unwrap_or("")
            ),
            status_display: self.instance.status.label().to_string(),
            book_title: self.book_title,
            borrower,
            is_overdue,
            instance: self.instance,
        }
    }
}

/// Copy as presented to clients, with derived fields
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookInstanceView {
    #[serde(flatten)]
    pub instance: BookInstance,
    pub display_name: String,
    pub status_display: String,
    pub book_title: Option<String>,
    pub borrower: Option<UserShort>,
    pub is_overdue: bool,
}

/// Create/update copy payload
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookInstanceForm {
    pub book_id: Option<i32>,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1 to 200 characters"))]
    pub imprint: String,
    #[serde(default, deserialize_with = "optional_date")]
    #[schema(value_type = Option<String>)]
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    #[serde(default)]
    pub status: LoanStatus,
}

pub const LOAN_STATUS_CHOICES: &[(&str, &str)] = &[
    ("d", "Maintenance"),
    ("o", "On loan"),
    ("a", "Available"),
    ("r", "Reserved"),
];

pub const BOOK_INSTANCE_FIELDS: &[FieldSpec] = &[
    FieldSpec::reference("book_id", "Book"),
    FieldSpec::text("imprint", "Imprint", 200),
    FieldSpec::date("due_back", "Due back"),
    FieldSpec::reference("borrower_id", "Borrower"),
    FieldSpec::reference("status", "Status")
        .with_kind(FieldKind::Choice)
        .with_choices(LOAN_STATUS_CHOICES)
        .with_help("Book availability"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_copy_defaults() {
        let a = BookInstance::new(Some(1), "Unlikely Imprint, 2016");
        let b = BookInstance::new(Some(1), "Unlikely Imprint, 2016");
        assert_eq!(a.status, LoanStatus::Maintenance);
        assert_eq!(a.due_back, None);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_is_overdue() {
        let today = date(2024, 3, 10);
        let mut copy = BookInstance::new(None, "imprint");
        assert!(!copy.is_overdue(today));

        copy.due_back = Some(today);
        assert!(!copy.is_overdue(today));

        copy.due_back = Some(date(2024, 3, 9));
        assert!(copy.is_overdue(today));

        copy.due_back = Some(date(2024, 3, 11));
        assert!(!copy.is_overdue(today));
    }

    #[test]
    fn test_status_codes() {
        for (code, label) in LOAN_STATUS_CHOICES {
            let status: LoanStatus = code.parse().unwrap();
            assert_eq!(status.code(), *code);
            assert_eq!(status.label(), *label);
        }
        assert!("m".parse::<LoanStatus>().is_err());
        assert_eq!(serde_json::to_value(LoanStatus::OnLoan).unwrap(), "o");
    }

    #[test]
    fn test_view_derives_display_fields() {
        let mut copy = BookInstance::new(Some(3), "imprint");
        copy.status = LoanStatus::OnLoan;
        copy.borrower_id = Some(7);
        copy.due_back = Some(date(2024, 1, 1));
        let id = copy.id;

        let view = BookInstanceRow {
            instance: copy,
            book_title: Some("Book Title".into()),
            borrower_username: Some("testuser1".into()),
        }
        .into_view(date(2024, 1, 2));

        assert_eq!(view.display_name, format!("{} (Book Title)", id));
        assert_eq!(view.status_display, "On loan");
        assert!(view.is_overdue);
        assert_eq!(view.borrower.map(|b| b.username), Some("testuser1".to_string()));
    }
}
