//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;
pub mod renewal;

use chrono::{NaiveDate, Utc};

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), config.catalog.clone()),
            loans: loans::LoansService::new(
                repository.clone(),
                config.catalog.clone(),
                &config.auth.login_url,
            ),
            repository,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}

/// Current date used for due-date comparisons
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
