//! Book instances (copies) repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceForm, BookInstanceRow, LoanStatus},
    repository::books::contains_pattern,
    services::renewal::CopyStore,
};

const ROW_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, bi.imprint, bi.due_back, bi.borrower_id, bi.status,
           b.title AS book_title, u.username AS borrower_username
    FROM book_instances bi
    LEFT JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get copy by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            "SELECT id, book_id, imprint, due_back, borrower_id, status FROM book_instances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    /// Get copy by ID joined with its book title and borrower
    pub async fn get_row(&self, id: Uuid) -> AppResult<BookInstanceRow> {
        let query = format!("{} WHERE bi.id = $1", ROW_SELECT);
        sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    pub async fn count(&self) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    pub async fn count_by_status(&self, status: LoanStatus) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances WHERE status = $1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Copies of books filed under a genre whose name contains `keyword`
    pub async fn count_in_genres_matching(&self, keyword: &str) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM book_instances bi
            WHERE bi.book_id IN (
                SELECT bg.book_id
                FROM book_genres bg
                JOIN genres g ON g.id = bg.genre_id
                WHERE LOWER(g.name) LIKE $1 ESCAPE '\'
            )
            "#,
        )
        .bind(contains_pattern(keyword))
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// One page of copies ordered by due date
    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<BookInstanceRow>> {
        let query = format!("{} ORDER BY bi.due_back, bi.id LIMIT $1 OFFSET $2", ROW_SELECT);
        let rows = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Copies of one book
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstanceRow>> {
        let query = format!("{} WHERE bi.book_id = $1 ORDER BY bi.due_back, bi.id", ROW_SELECT);
        let rows = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Count copies on loan, optionally restricted to one borrower
    pub async fn count_on_loan(&self, borrower_id: Option<i32>) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = $1 AND ($2::int IS NULL OR borrower_id = $2)
            "#,
        )
        .bind(LoanStatus::OnLoan)
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// One page of copies on loan ordered by due date, optionally for one borrower
    pub async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<BookInstanceRow>> {
        let query = format!(
            r#"{}
            WHERE bi.status = $1 AND ($2::int IS NULL OR bi.borrower_id = $2)
            ORDER BY bi.due_back, bi.id
            LIMIT $3 OFFSET $4
            "#,
            ROW_SELECT
        );
        let rows = sqlx::query_as::<_, BookInstanceRow>(&query)
            .bind(LoanStatus::OnLoan)
            .bind(borrower_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, copy: &BookInstanceForm) -> AppResult<BookInstance> {
        let mut instance = BookInstance::new(copy.book_id, copy.imprint.clone());
        instance.due_back = copy.due_back;
        instance.borrower_id = copy.borrower_id;
        instance.status = copy.status;

        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(instance.id)
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.borrower_id)
        .bind(instance.status)
        .execute(&self.pool)
        .await?;

        Ok(instance)
    }

    pub async fn update(&self, id: Uuid, copy: &BookInstanceForm) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            UPDATE book_instances
            SET book_id = $1, imprint = $2, due_back = $3, borrower_id = $4, status = $5
            WHERE id = $6
            RETURNING id, book_id, imprint, due_back, borrower_id, status
            "#,
        )
        .bind(copy.book_id)
        .bind(&copy.imprint)
        .bind(copy.due_back)
        .bind(copy.borrower_id)
        .bind(copy.status)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    /// Set the due date of a copy, leaving every other column untouched
    pub async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $1 WHERE id = $2")
            .bind(due_back)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CopyStore for BookInstancesRepository {
    async fn get_copy(&self, id: Uuid) -> AppResult<BookInstance> {
        self.get_by_id(id).await
    }

    async fn update_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<()> {
        self.set_due_back(id, due_back).await
    }
}
