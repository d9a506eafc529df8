//! Librarian renewal of a copy's due-back date
//!
//! A renewal request is authorized, the copy is loaded, and on submission
//! the proposed date is validated against today. Only a valid submission
//! touches storage, and it only writes `due_back`.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        book_instance::BookInstance,
        form::{parse_form_date, REQUIRED_MESSAGE},
        user::{Permission, UserClaims},
    },
};

/// Latest allowed renewal, in weeks from today
pub const MAX_RENEWAL_WEEKS: i64 = 4;
/// Proposed renewal shown on a blank form, in weeks from today
pub const DEFAULT_RENEWAL_WEEKS: i64 = 3;

pub const RENEWAL_DATE_LABEL: &str = "Renewal date";
pub const RENEWAL_HELP_TEXT: &str = "Enter a date between now and 4 weeks (default 3).";

/// Listing of every copy on loan; where a successful renewal lands
pub const ALL_BORROWED_URL: &str = "/catalog/borrowed/";

/// Why a proposed renewal date was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenewalDateError {
    #[error("Invalid date - renewal in past")]
    InPast,
    #[error("Invalid date - renewal more than 4 weeks ahead")]
    TooFarAhead,
}

/// Accept `candidate` when `today <= candidate <= today + 4 weeks`.
pub fn validate_renewal_date(
    candidate: NaiveDate,
    today: NaiveDate,
) -> Result<NaiveDate, RenewalDateError> {
    if candidate < today {
        return Err(RenewalDateError::InPast);
    }
    if candidate > today + Duration::weeks(MAX_RENEWAL_WEEKS) {
        return Err(RenewalDateError::TooFarAhead);
    }
    Ok(candidate)
}

pub fn default_renewal_date(today: NaiveDate) -> NaiveDate {
    today + Duration::weeks(DEFAULT_RENEWAL_WEEKS)
}

/// Submitted renewal form
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RenewBookForm {
    /// `YYYY-MM-DD` or `DD/MM/YYYY`
    #[serde(default)]
    pub renewal_date: Option<String>,
}

impl RenewBookForm {
    /// Parse and validate the submitted date, yielding the form error message on failure
    pub fn clean(&self, today: NaiveDate) -> Result<NaiveDate, String> {
        let raw = self.renewal_date.as_deref().unwrap_or_default();
        let date = parse_form_date(raw)
            .map_err(str::to_string)?
            .ok_or_else(|| REQUIRED_MESSAGE.to_string())?;
        validate_renewal_date(date, today).map_err(|e| e.to_string())
    }
}

/// The renewal form as shown to the librarian
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalFormState {
    pub label: String,
    pub help_text: String,
    /// Proposed date on a blank form
    pub initial: NaiveDate,
    /// Value submitted with a rejected form
    pub value: Option<String>,
    pub errors: Vec<String>,
}

/// Context of the renewal page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RenewalPage {
    pub book_instance: BookInstance,
    pub form: RenewalFormState,
}

/// What the caller asked for
#[derive(Debug, Clone)]
pub enum RenewalRequest {
    /// Show the blank form
    Show,
    /// Submit a proposed date
    Submit(RenewBookForm),
}

/// Successful end states of a renewal request
#[derive(Debug, Clone)]
pub enum RenewalOutcome {
    /// Waiting for (corrected) input
    Form(RenewalPage),
    /// Due date saved; continue to `redirect_to`
    Renewed {
        instance: BookInstance,
        redirect_to: &'static str,
    },
}

/// Copy lookup and persistence needed by the renewal workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CopyStore: Send + Sync {
    /// Load a copy, failing with [`AppError::NotFound`] when absent
    async fn get_copy(&self, id: Uuid) -> AppResult<BookInstance>;

    async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()>;
}

#[derive(Clone)]
pub struct RenewalWorkflow<S> {
    store: S,
    login_url: String,
}

impl<S: CopyStore> RenewalWorkflow<S> {
    pub fn new(store: S, login_url: impl Into<String>) -> Self {
        Self {
            store,
            login_url: login_url.into(),
        }
    }

    /// Require an authenticated librarian.
    ///
    /// Anonymous callers are sent to the login page with `origin` as the
    /// return path; authenticated callers without the permission are refused.
    pub fn authorize<'a>(
        &self,
        principal: Option<&'a UserClaims>,
        origin: &str,
    ) -> AppResult<&'a UserClaims> {
        let principal = principal.ok_or_else(|| AppError::LoginRequired {
            login_url: self.login_url.clone(),
            next: origin.to_string(),
        })?;
        principal.require(Permission::CanMarkReturned)?;
        Ok(principal)
    }

    /// Run one renewal request to completion
    pub async fn run(
        &self,
        principal: Option<&UserClaims>,
        copy_id: Uuid,
        origin: &str,
        request: RenewalRequest,
        today: NaiveDate,
    ) -> AppResult<RenewalOutcome> {
        let principal = self.authorize(principal, origin)?;
        let mut copy = self.store.get_copy(copy_id).await?;

        let form = match request {
            RenewalRequest::Show => {
                return Ok(RenewalOutcome::Form(Self::page(copy, today, None, Vec::new())));
            }
            RenewalRequest::Submit(form) => form,
        };

        match form.clean(today) {
            Ok(due_back) => {
                self.store.update_due_back(copy.id, due_back).await?;
                copy.due_back = Some(due_back);
                tracing::info!(
                    copy_id = %copy.id,
                    due_back = %due_back,
                    librarian = %principal.sub,
                    "Book instance renewed"
                );
                Ok(RenewalOutcome::Renewed {
                    instance: copy,
                    redirect_to: ALL_BORROWED_URL,
                })
            }
            Err(message) => {
                tracing::debug!(copy_id = %copy.id, "Renewal rejected: {}", message);
                Ok(RenewalOutcome::Form(Self::page(
                    copy,
                    today,
                    form.renewal_date,
                    vec![message],
                )))
            }
        }
    }

    fn page(
        book_instance: BookInstance,
        today: NaiveDate,
        value: Option<String>,
        errors: Vec<String>,
    ) -> RenewalPage {
        RenewalPage {
            book_instance,
            form: RenewalFormState {
                label: RENEWAL_DATE_LABEL.to_string(),
                help_text: RENEWAL_HELP_TEXT.to_string(),
                initial: default_renewal_date(today),
                value,
                errors,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::book_instance::LoanStatus;
    use mockall::predicate::eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 15).unwrap()
    }

    fn days(n: i64) -> Duration {
        Duration::days(n)
    }

    fn claims(permissions: &[&str]) -> UserClaims {
        UserClaims {
            sub: "testuser2".into(),
            user_id: 2,
            is_superuser: false,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: 0,
            iat: 0,
        }
    }

    fn librarian() -> UserClaims {
        claims(&["catalog.can_mark_returned"])
    }

    fn copy_in_maintenance() -> BookInstance {
        BookInstance::new(Some(1), "Unlikely Imprint, 2016")
    }

    fn submit(date: NaiveDate) -> RenewalRequest {
        RenewalRequest::Submit(RenewBookForm {
            renewal_date: Some(date.format("%Y-%m-%d").to_string()),
        })
    }

    fn store_with(copy: &BookInstance) -> MockCopyStore {
        let mut store = MockCopyStore::new();
        let loaded = copy.clone();
        store
            .expect_get_copy()
            .with(eq(copy.id))
            .times(1)
            .returning(move |_| Ok(loaded.clone()));
        store
    }

    // Validator

    #[test]
    fn test_rejects_dates_in_past() {
        for offset in [1, 7, 365] {
            assert_eq!(
                validate_renewal_date(today() - days(offset), today()),
                Err(RenewalDateError::InPast)
            );
        }
    }

    #[test]
    fn test_rejects_dates_beyond_four_weeks() {
        for offset in [29, 35, 400] {
            assert_eq!(
                validate_renewal_date(today() + days(offset), today()),
                Err(RenewalDateError::TooFarAhead)
            );
        }
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        assert_eq!(validate_renewal_date(today(), today()), Ok(today()));
        let max = today() + days(28);
        assert_eq!(validate_renewal_date(max, today()), Ok(max));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let candidate = today() + days(10);
        let first = validate_renewal_date(candidate, today()).unwrap();
        assert_eq!(validate_renewal_date(first, today()), Ok(candidate));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(RenewalDateError::InPast.to_string(), "Invalid date - renewal in past");
        assert_eq!(
            RenewalDateError::TooFarAhead.to_string(),
            "Invalid date - renewal more than 4 weeks ahead"
        );
    }

    #[test]
    fn test_default_is_three_weeks_ahead() {
        assert_eq!(default_renewal_date(today()), today() + days(21));
        assert!(validate_renewal_date(default_renewal_date(today()), today()).is_ok());
    }

    #[test]
    fn test_form_clean() {
        let form = |raw: &str| RenewBookForm {
            renewal_date: Some(raw.to_string()),
        };
        assert_eq!(form("2024-05-15").clean(today()), Ok(today()));
        assert_eq!(form("12/06/2024").clean(today()), Ok(today() + days(28)));
        assert_eq!(
            form("13/06/2024").clean(today()),
            Err("Invalid date - renewal more than 4 weeks ahead".to_string())
        );
        assert_eq!(form("soon").clean(today()), Err("Enter a valid date.".to_string()));
        assert_eq!(
            RenewBookForm::default().clean(today()),
            Err("This field is required.".to_string())
        );
    }

    // Workflow

    #[tokio::test]
    async fn test_show_proposes_three_weeks() {
        let copy = copy_in_maintenance();
        let mut store = store_with(&copy);
        store.expect_update_due_back().never();
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");

        let outcome = workflow
            .run(Some(&librarian()), copy.id, "/renew", RenewalRequest::Show, today())
            .await
            .unwrap();

        match outcome {
            RenewalOutcome::Form(page) => {
                assert_eq!(page.form.initial, today() + days(21));
                assert_eq!(page.form.help_text, RENEWAL_HELP_TEXT);
                assert!(page.form.errors.is_empty());
                assert_eq!(page.book_instance, copy);
            }
            other => panic!("expected form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_renew_today_saves_and_redirects() {
        let copy = copy_in_maintenance();
        assert_eq!(copy.status, LoanStatus::Maintenance);
        let mut store = store_with(&copy);
        store
            .expect_update_due_back()
            .with(eq(copy.id), eq(today()))
            .times(1)
            .returning(|_, _| Ok(()));
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");

        let outcome = workflow
            .run(Some(&librarian()), copy.id, "/renew", submit(today()), today())
            .await
            .unwrap();

        match outcome {
            RenewalOutcome::Renewed { instance, redirect_to } => {
                assert_eq!(redirect_to, ALL_BORROWED_URL);
                assert_eq!(instance.due_back, Some(today()));
                assert_eq!(instance.status, LoanStatus::Maintenance);
                assert_eq!(instance.imprint, copy.imprint);
            }
            other => panic!("expected renewal, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_past_date_rerenders_without_saving() {
        let copy = copy_in_maintenance();
        let mut store = store_with(&copy);
        store.expect_update_due_back().never();
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");

        let outcome = workflow
            .run(Some(&librarian()), copy.id, "/renew", submit(today() - days(1)), today())
            .await
            .unwrap();

        match outcome {
            RenewalOutcome::Form(page) => {
                assert_eq!(page.form.errors, vec!["Invalid date - renewal in past".to_string()]);
                assert_eq!(page.book_instance.due_back, None);
                assert_eq!(page.form.value.as_deref(), Some("2024-05-14"));
            }
            other => panic!("expected form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_far_future_date_rerenders_without_saving() {
        let copy = copy_in_maintenance();
        let mut store = store_with(&copy);
        store.expect_update_due_back().never();
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");

        let outcome = workflow
            .run(Some(&librarian()), copy.id, "/renew", submit(today() + days(29)), today())
            .await
            .unwrap();

        match outcome {
            RenewalOutcome::Form(page) => assert_eq!(
                page.form.errors,
                vec!["Invalid date - renewal more than 4 weeks ahead".to_string()]
            ),
            other => panic!("expected form, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_anonymous_is_sent_to_login() {
        let mut store = MockCopyStore::new();
        store.expect_get_copy().never();
        store.expect_update_due_back().never();
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");
        let id = Uuid::new_v4();
        let origin = format!("/catalog/book/{}/renew/", id);

        let err = workflow
            .run(None, id, &origin, submit(today()), today())
            .await
            .unwrap_err();

        match err {
            AppError::LoginRequired { login_url, next } => {
                assert_eq!(login_url, "/accounts/login/");
                assert_eq!(next, origin);
            }
            other => panic!("expected login redirect, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_permission_is_forbidden() {
        let mut store = MockCopyStore::new();
        store.expect_get_copy().never();
        store.expect_update_due_back().never();
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");

        let borrower = claims(&["catalog.add_author"]);
        let err = workflow
            .run(Some(&borrower), Uuid::new_v4(), "/renew", submit(today()), today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn test_unknown_copy_is_not_found() {
        let id = Uuid::new_v4();
        let mut store = MockCopyStore::new();
        store
            .expect_get_copy()
            .with(eq(id))
            .times(1)
            .returning(|id| Err(AppError::NotFound(format!("Book instance {} not found", id))));
        store.expect_update_due_back().never();
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");

        let err = workflow
            .run(Some(&librarian()), id, "/renew", submit(today()), today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_superuser_may_renew() {
        let copy = copy_in_maintenance();
        let mut store = store_with(&copy);
        store
            .expect_update_due_back()
            .times(1)
            .returning(|_, _| Ok(()));
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");
        let mut admin = claims(&[]);
        admin.is_superuser = true;

        let outcome = workflow
            .run(Some(&admin), copy.id, "/renew", submit(today() + days(14)), today())
            .await
            .unwrap();

        assert!(matches!(outcome, RenewalOutcome::Renewed { .. }));
    }

    #[tokio::test]
    async fn test_storage_failure_is_reported() {
        let copy = copy_in_maintenance();
        let mut store = store_with(&copy);
        store
            .expect_update_due_back()
            .times(1)
            .returning(|_, _| Err(AppError::Database(sqlx::Error::PoolTimedOut)));
        let workflow = RenewalWorkflow::new(store, "/accounts/login/");

        let err = workflow
            .run(Some(&librarian()), copy.id, "/renew", submit(today()), today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
    }
}
