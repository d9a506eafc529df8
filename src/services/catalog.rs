//! Catalog browsing and management service

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorDetails, AuthorForm, AUTHOR_FIELDS, AUTHOR_INITIAL_DATE_OF_DEATH},
        book::{
            display_genre, Book, BookDetails, BookForm, BookSummary, BOOK_FIELDS,
            ISBN_DUPLICATE_MESSAGE,
        },
        book_instance::{
            BookInstance, BookInstanceForm, BookInstanceView, LoanStatus, BOOK_INSTANCE_FIELDS,
        },
        form::FormSchema,
        genre::{Genre, GenreDetails, Language, NameForm, GENRE_FIELDS, LANGUAGE_FIELDS},
        pagination::{Paginated, Pager},
        user::Entity,
    },
    repository::Repository,
    services::today,
};

/// Counts shown on the catalog home page
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndexStats {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status `a`
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Books in genres whose name contains the configured keyword
    pub books: i64,
    /// Copies of those books
    pub instances_available: i64,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    config: CatalogConfig,
}

impl CatalogService {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    pub async fn index_stats(&self) -> AppResult<IndexStats> {
        Ok(IndexStats {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_by_status(LoanStatus::Available)
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
            books: self
                .repository
                .books
                .count_in_genres_matching(&self.config.genre_keyword)
                .await?,
            instances_available: self
                .repository
                .book_instances
                .count_in_genres_matching(&self.config.genre_keyword)
                .await?,
        })
    }

    /// Blank form for creating an entity
    pub fn form_schema(entity: Entity) -> FormSchema {
        match entity {
            Entity::Author => FormSchema::new(entity, AUTHOR_FIELDS).with_initial(
                serde_json::json!({ "date_of_death": AUTHOR_INITIAL_DATE_OF_DEATH }),
            ),
            Entity::Book => FormSchema::new(entity, BOOK_FIELDS),
            Entity::BookInstance => FormSchema::new(entity, BOOK_INSTANCE_FIELDS)
                .with_initial(serde_json::json!({ "status": LoanStatus::default().code() })),
            Entity::Genre => FormSchema::new(entity, GENRE_FIELDS),
            Entity::Language => FormSchema::new(entity, LANGUAGE_FIELDS),
        }
    }

    // Authors

    pub async fn list_authors(&self, page: Option<i64>) -> AppResult<Paginated<Author>> {
        let total = self.repository.authors.count().await?;
        let pager = Pager::resolve(page, self.config.page_size, total)?;
        let authors = self
            .repository
            .authors
            .list(pager.limit(), pager.offset())
            .await?;
        Ok(Paginated::new(authors, pager))
    }

    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetails {
            display_name: author.to_string(),
            author,
            books,
        })
    }

    pub async fn create_author(&self, author: AuthorForm) -> AppResult<Author> {
        author.validate()?;
        let created = self.repository.authors.create(&author).await?;
        tracing::info!(author_id = created.id, "Created author");
        Ok(created)
    }

    pub async fn update_author(&self, id: i32, author: AuthorForm) -> AppResult<Author> {
        author.validate()?;
        self.repository.authors.update(id, &author).await
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, "Deleted author");
        Ok(())
    }

    // Books

    pub async fn list_books(&self, page: Option<i64>) -> AppResult<Paginated<BookSummary>> {
        let total = self.repository.books.count().await?;
        let pager = Pager::resolve(page, self.config.page_size, total)?;
        let books = self
            .repository
            .books
            .list(pager.limit(), pager.offset())
            .await?;
        Ok(Paginated::new(books, pager))
    }

    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => Some(self.repository.languages.get_by_id(language_id).await?),
            None => None,
        };
        let genres = self.repository.books.genres_of(id).await?;

        let today = today();
        let copies = self
            .repository
            .book_instances
            .list_for_book(id)
            .await?
            .into_iter()
            .map(|row| row.into_view(today))
            .collect();

        Ok(BookDetails {
            display_genre: display_genre(&genres),
            book,
            author,
            language,
            genres,
            copies,
        })
    }

    /// Check that the author, language and genres a book points at exist
    async fn check_book_references(&self, book: &BookForm) -> AppResult<()> {
        if let Some(author_id) = book.author_id {
            if !self.repository.authors.exists(author_id).await? {
                return Err(AppError::BadRequest(format!("Author {} does not exist", author_id)));
            }
        }
        if let Some(language_id) = book.language_id {
            if !self.repository.languages.exists(language_id).await? {
                return Err(AppError::BadRequest(format!(
                    "Language {} does not exist",
                    language_id
                )));
            }
        }
        if !self.repository.genres.all_exist(&book.genre_ids).await? {
            return Err(AppError::BadRequest("Unknown genre selected".to_string()));
        }
        Ok(())
    }

    pub async fn create_book(&self, book: BookForm) -> AppResult<Book> {
        book.validate()?;
        self.check_book_references(&book).await?;
        if self.repository.books.isbn_exists(&book.isbn, None).await? {
            return Err(AppError::Conflict(ISBN_DUPLICATE_MESSAGE.to_string()));
        }

        let created = self.repository.books.create(&book).await?;
        tracing::info!(book_id = created.id, isbn = %created.isbn, "Created book");
        Ok(created)
    }

    pub async fn update_book(&self, id: i32, book: BookForm) -> AppResult<Book> {
        book.validate()?;
        self.check_book_references(&book).await?;
        if self.repository.books.isbn_exists(&book.isbn, Some(id)).await? {
            return Err(AppError::Conflict(ISBN_DUPLICATE_MESSAGE.to_string()));
        }
        self.repository.books.update(id, &book).await
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, "Deleted book");
        Ok(())
    }

    // Genres

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<GenreDetails> {
        let genre = self.repository.genres.get_by_id(id).await?;
        let books = self.repository.books.list_by_genre(id).await?;
        Ok(GenreDetails { genre, books })
    }

    pub async fn create_genre(&self, genre: NameForm) -> AppResult<Genre> {
        genre.validate()?;
        self.repository.genres.create(&genre.name).await
    }

    pub async fn update_genre(&self, id: i32, genre: NameForm) -> AppResult<Genre> {
        genre.validate()?;
        self.repository.genres.update(id, &genre.name).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await
    }

    // Languages

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.repository.languages.get_by_id(id).await
    }

    pub async fn create_language(&self, language: NameForm) -> AppResult<Language> {
        language.validate()?;
        self.repository.languages.create(&language.name).await
    }

    pub async fn update_language(&self, id: i32, language: NameForm) -> AppResult<Language> {
        language.validate()?;
        self.repository.languages.update(id, &language.name).await
    }

    pub async fn delete_language(&self, id: i32) -> AppResult<()> {
        self.repository.languages.delete(id).await
    }

    // Book instances

    pub async fn list_book_instances(
        &self,
        page: Option<i64>,
    ) -> AppResult<Paginated<BookInstanceView>> {
        let total = self.repository.book_instances.count().await?;
        let pager = Pager::resolve(page, self.config.page_size, total)?;
        let rows = self
            .repository
            .book_instances
            .list(pager.limit(), pager.offset())
            .await?;
        let today = today();
        Ok(Paginated::new(rows, pager).map(|row| row.into_view(today)))
    }

    pub async fn get_book_instance(&self, id: Uuid) -> AppResult<BookInstanceView> {
        let row = self.repository.book_instances.get_row(id).await?;
        Ok(row.into_view(today()))
    }

    async fn check_copy_references(&self, copy: &BookInstanceForm) -> AppResult<()> {
        if let Some(book_id) = copy.book_id {
            if !self.repository.books.exists(book_id).await? {
                return Err(AppError::BadRequest(format!("Book {} does not exist", book_id)));
            }
        }
        if let Some(borrower_id) = copy.borrower_id {
            if !self.repository.users.exists(borrower_id).await? {
                return Err(AppError::BadRequest(format!(
                    "Borrower {} does not exist",
                    borrower_id
                )));
            }
        }
        Ok(())
    }

    pub async fn create_book_instance(&self, copy: BookInstanceForm) -> AppResult<BookInstance> {
        copy.validate()?;
        self.check_copy_references(&copy).await?;
        let created = self.repository.book_instances.create(&copy).await?;
        tracing::info!(copy_id = %created.id, "Created book instance");
        Ok(created)
    }

    pub async fn update_book_instance(
        &self,
        id: Uuid,
        copy: BookInstanceForm,
    ) -> AppResult<BookInstance> {
        copy.validate()?;
        self.check_copy_references(&copy).await?;
        self.repository.book_instances.update(id, &copy).await
    }

    pub async fn delete_book_instance(&self, id: Uuid) -> AppResult<()> {
        self.repository.book_instances.delete(id).await?;
        tracing::info!(copy_id = %id, "Deleted book instance");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_form_initial_date_of_death() {
        let form = CatalogService::form_schema(Entity::Author);
        assert_eq!(form.entity, "author");
        assert_eq!(form.initial["date_of_death"], "11/11/2023");
        assert!(form.fields.iter().any(|f| f.name == "date_of_death" && f.label == "Died"));
    }

    #[test]
    fn test_genre_form_help_text() {
        let form = CatalogService::form_schema(Entity::Genre);
        let name = &form.fields[0];
        assert_eq!(name.max_length, Some(200));
        assert_eq!(
            name.help_text,
            Some("Enter a book genre (e.g. Science Fiction, French Poetry etc.)")
        );
    }

    #[test]
    fn test_book_instance_form_defaults_to_maintenance() {
        let form = CatalogService::form_schema(Entity::BookInstance);
        assert_eq!(form.initial["status"], "d");
        let status = form.fields.iter().find(|f| f.name == "status").unwrap();
        assert_eq!(status.choices.len(), 4);
    }
}
