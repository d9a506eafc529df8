//! Repository for name-only records (genres, languages)
//!
//! Names are unique case-insensitively; the check compares normalized
//! names and the `LOWER(name)` unique index backs it up.

use std::marker::PhantomData;

use sqlx::{postgres::PgRow, FromRow, Pool, Postgres};

use crate::{
    error::{map_constraint_error, AppError, AppResult},
    models::form::normalized_name,
};

#[derive(Clone)]
pub struct NamedRepository<T> {
    pool: Pool<Postgres>,
    table: &'static str,
    label: &'static str,
    duplicate_message: &'static str,
    _record: PhantomData<fn() -> T>,
}

impl<T> NamedRepository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(
        pool: Pool<Postgres>,
        table: &'static str,
        label: &'static str,
        duplicate_message: &'static str,
    ) -> Self {
        Self {
            pool,
            table,
            label,
            duplicate_message,
            _record: PhantomData,
        }
    }

    /// Get record by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<T> {
        sqlx::query_as::<_, T>(&format!("SELECT id, name FROM {} WHERE id = $1", self.table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", self.label, id)))
    }

    /// All records ordered by name
    pub async fn list(&self) -> AppResult<Vec<T>> {
        let rows = sqlx::query_as::<_, T>(&format!("SELECT id, name FROM {} ORDER BY name", self.table))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            self.table
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", self.table))
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// True when every id in `ids` exists
    pub async fn all_exist(&self, ids: &[i32]) -> AppResult<bool> {
        if ids.is_empty() {
            return Ok(true);
        }
        let found: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(DISTINCT id) FROM {} WHERE id = ANY($1)",
            self.table
        ))
        .bind(ids)
        .fetch_one(&self.pool)
        .await?;

        let mut distinct = ids.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        Ok(found == distinct.len() as i64)
    }

    /// Check if a name is taken, ignoring case
    pub async fn name_exists(&self, name: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE LOWER(name) = $1 AND ($2::int IS NULL OR id != $2))",
            self.table
        ))
        .bind(normalized_name(name))
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, name: &str) -> AppResult<T> {
        let name = name.trim();
        if self.name_exists(name, None).await? {
            return Err(AppError::Conflict(self.duplicate_message.to_string()));
        }

        sqlx::query_as::<_, T>(&format!(
            "INSERT INTO {} (name) VALUES ($1) RETURNING id, name",
            self.table
        ))
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, self.duplicate_message))
    }

    pub async fn update(&self, id: i32, name: &str) -> AppResult<T> {
        let name = name.trim();
        if self.name_exists(name, Some(id)).await? {
            return Err(AppError::Conflict(self.duplicate_message.to_string()));
        }

        sqlx::query_as::<_, T>(&format!(
            "UPDATE {} SET name = $1 WHERE id = $2 RETURNING id, name",
            self.table
        ))
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, self.duplicate_message))?
        .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", self.label, id)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", self.table))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} with id {} not found", self.label, id)));
        }
        Ok(())
    }
}
