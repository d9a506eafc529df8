//! Books repository for database operations

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{map_constraint_error, AppError, AppResult},
    models::{
        book::{Book, BookForm, BookSummary, ISBN_DUPLICATE_MESSAGE},
        genre::Genre,
    },
};

const SUMMARY_SELECT: &str = r#"
    SELECT b.id, b.title, b.isbn, b.author_id,
           CASE WHEN a.id IS NULL THEN NULL
                ELSE a.last_name || ', ' || a.first_name END AS author_name
    FROM books b
    LEFT JOIN authors a ON a.id = b.author_id
"#;

/// `LIKE` pattern matching names that contain `keyword`, ignoring case.
/// Wildcards in the keyword are matched literally.
pub fn contains_pattern(keyword: &str) -> String {
    let mut pattern = String::with_capacity(keyword.len() + 2);
    pattern.push('%');
    for c in keyword.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn exists(&self, id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    /// Books filed under at least one genre whose name contains `keyword`
    pub async fn count_in_genres_matching(&self, keyword: &str) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT bg.book_id)
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE LOWER(g.name) LIKE $1 ESCAPE '\'
            "#,
        )
        .bind(contains_pattern(keyword))
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// One page of books ordered by title, then author
    pub async fn list(&self, limit: i64, offset: i64) -> AppResult<Vec<BookSummary>> {
        let query = format!(
            "{} ORDER BY b.title, b.author_id, b.id LIMIT $1 OFFSET $2",
            SUMMARY_SELECT
        );
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Books written by an author
    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.title, b.id", SUMMARY_SELECT);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Books filed under a genre
    pub async fn list_by_genre(&self, genre_id: i32) -> AppResult<Vec<BookSummary>> {
        let query = format!(
            "{} JOIN book_genres bg ON bg.book_id = b.id WHERE bg.genre_id = $1 ORDER BY b.title, b.id",
            SUMMARY_SELECT
        );
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(genre_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    /// Genres of a book, ordered by name
    pub async fn genres_of(&self, book_id: i32) -> AppResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name
            FROM genres g
            JOIN book_genres bg ON bg.genre_id = g.id
            WHERE bg.book_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    /// Check if an ISBN is already catalogued
    pub async fn isbn_exists(&self, isbn: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM books WHERE isbn = $1 AND ($2::int IS NULL OR id != $2))",
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(&self, book: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.language_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, ISBN_DUPLICATE_MESSAGE))?;

        Self::replace_genres(&mut tx, created.id, &book.genre_ids).await?;
        tx.commit().await?;

        Ok(created)
    }

    pub async fn update(&self, id: i32, book: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $1, author_id = $2, summary = $3, isbn = $4, language_id = $5
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.language_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, ISBN_DUPLICATE_MESSAGE))?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        Self::replace_genres(&mut tx, id, &book.genre_ids).await?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn replace_genres(
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO book_genres (book_id, genre_id)
            SELECT $1, UNNEST($2::int[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(book_id)
        .bind(genre_ids)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Delete a book. Refused while copies of it exist.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let has_copies: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM book_instances WHERE book_id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if has_copies {
            return Err(AppError::Protected(
                "Book cannot be deleted while copies of it exist".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "Book is still referenced"))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_ignores_case() {
        assert_eq!(contains_pattern("Development"), "%development%");
        assert_eq!(contains_pattern(""), "%%");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
