//! Loan listings and librarian renewal

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    config::CatalogConfig,
    error::AppResult,
    models::{
        book_instance::BookInstanceView,
        pagination::{Paginated, Pager},
        user::{Permission, UserClaims},
    },
    repository::{book_instances::BookInstancesRepository, Repository},
    services::{
        renewal::{RenewalOutcome, RenewalRequest, RenewalWorkflow},
        today,
    },
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    config: CatalogConfig,
    renewal: RenewalWorkflow<BookInstancesRepository>,
}

impl LoansService {
    pub fn new(repository: Repository, config: CatalogConfig, login_url: &str) -> Self {
        Self {
            renewal: RenewalWorkflow::new(repository.book_instances.clone(), login_url),
            repository,
            config,
        }
    }

    async fn on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Option<i64>,
    ) -> AppResult<Paginated<BookInstanceView>> {
        let books = &self.repository.book_instances;
        let total = books.count_on_loan(borrower_id).await?;
        let pager = Pager::resolve(page, self.config.loans_page_size, total)?;
        let rows = books
            .list_on_loan(borrower_id, pager.limit(), pager.offset())
            .await?;
        let today = today();
        Ok(Paginated::new(rows, pager).map(|row| row.into_view(today)))
    }

    /// Copies on loan to the caller, soonest due first
    pub async fn my_borrowed(
        &self,
        user: &UserClaims,
        page: Option<i64>,
    ) -> AppResult<Paginated<BookInstanceView>> {
        self.on_loan(Some(user.user_id), page).await
    }

    /// Every copy on loan (librarians only)
    pub async fn all_borrowed(
        &self,
        user: &UserClaims,
        page: Option<i64>,
    ) -> AppResult<Paginated<BookInstanceView>> {
        user.require(Permission::CanMarkReturned)?;
        self.on_loan(None, page).await
    }

    /// Handle a renewal request for copy `copy_id` reached at `origin`
    pub async fn renew(
        &self,
        principal: Option<&UserClaims>,
        copy_id: Uuid,
        origin: &str,
        request: RenewalRequest,
        today: NaiveDate,
    ) -> AppResult<RenewalOutcome> {
        self.renewal
            .run(principal, copy_id, origin, request, today)
            .await
    }
}
