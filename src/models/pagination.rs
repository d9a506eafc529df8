//! Page-number pagination shared by the list endpoints

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::author::Author;
use super::book::BookSummary;
use super::book_instance::BookInstanceView;
use crate::error::{AppError, AppResult};

/// `?page=N` query parameter (1-based)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
}

/// A validated page window over `total` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub num_pages: i64,
}

impl Pager {
    /// Resolve the requested page against the row count.
    ///
    /// An empty listing still has one (empty) page; anything outside
    /// `1..=num_pages` is a not-found.
    pub fn resolve(page: Option<i64>, per_page: i64, total: i64) -> AppResult<Self> {
        let per_page = per_page.max(1);
        let num_pages = ((total + per_page - 1) / per_page).max(1);
        let page = page.unwrap_or(1);

        if page < 1 || page > num_pages {
            return Err(AppError::NotFound(format!("Invalid page ({})", page)));
        }

        Ok(Self {
            page,
            per_page,
            total,
            num_pages,
        })
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }
}

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    AuthorPage = Paginated<Author>,
    BookPage = Paginated<BookSummary>,
    BookInstancePage = Paginated<BookInstanceView>
)]
pub struct Paginated<T> {
    /// Rows of the current page
    pub items: Vec<T>,
    /// Total number of rows
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Rows per page
    pub per_page: i64,
    pub num_pages: i64,
    /// True when there is more than one page
    pub is_paginated: bool,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, pager: Pager) -> Self {
        Self {
            items,
            total: pager.total,
            page: pager.page,
            per_page: pager.per_page,
            num_pages: pager.num_pages,
            is_paginated: pager.num_pages > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            num_pages: self.num_pages,
            is_paginated: self.is_paginated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thirteen_rows_five_per_page() {
        let first = Pager::resolve(None, 5, 13).unwrap();
        assert_eq!(first.num_pages, 3);
        assert_eq!((first.offset(), first.limit()), (0, 5));

        let last = Pager::resolve(Some(3), 5, 13).unwrap();
        assert_eq!(last.offset(), 10);

        assert!(Pager::resolve(Some(4), 5, 13).is_err());
        assert!(Pager::resolve(Some(0), 5, 13).is_err());
    }

    #[test]
    fn test_empty_listing_has_one_page() {
        let pager = Pager::resolve(Some(1), 10, 0).unwrap();
        assert_eq!(pager.num_pages, 1);
        let page: Paginated<i32> = Paginated::new(vec![], pager);
        assert!(!page.is_paginated);
        assert!(Pager::resolve(Some(2), 10, 0).is_err());
    }

    #[test]
    fn test_is_paginated_flag() {
        let page = Paginated::new(vec![1, 2, 3, 4, 5], Pager::resolve(Some(1), 5, 13).unwrap());
        assert!(page.is_paginated);
        assert_eq!(page.items.len(), 5);
        let doubled = page.map(|n| n * 2);
        assert_eq!(doubled.items, vec![2, 4, 6, 8, 10]);
    }
}
