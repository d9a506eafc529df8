//! Repository layer for database operations

pub mod authors;
pub mod book_instances;
pub mod books;
pub mod named;
pub mod users;

use sqlx::{Pool, Postgres};

use crate::models::genre::{
    Genre, Language, GENRE_DUPLICATE_MESSAGE, LANGUAGE_DUPLICATE_MESSAGE,
};

pub type GenresRepository = named::NamedRepository<Genre>;
pub type LanguagesRepository = named::NamedRepository<Language>;

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub book_instances: book_instances::BookInstancesRepository,
    pub genres: GenresRepository,
    pub languages: LanguagesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            book_instances: book_instances::BookInstancesRepository::new(pool.clone()),
            genres: named::NamedRepository::new(pool.clone(), "genres", "Genre", GENRE_DUPLICATE_MESSAGE),
            languages: named::NamedRepository::new(
                pool.clone(),
                "languages",
                "Language",
                LANGUAGE_DUPLICATE_MESSAGE,
            ),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness probe
    pub async fn ping(&self) -> crate::error::AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
