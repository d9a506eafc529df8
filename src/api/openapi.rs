//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, book_instances, books, catalog, genres, health, loans};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LocalLibrary API",
        version = "0.1.0",
        description = "Library catalog with loan tracking and librarian renewals"
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Accounts
        auth::login_form,
        auth::login,
        auth::logout,
        auth::create_user,
        // Catalog
        catalog::index,
        books::list_books,
        books::get_book,
        books::create_form,
        books::create_book,
        books::update_book,
        books::delete_book,
        authors::list_authors,
        authors::get_author,
        authors::create_form,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        genres::list_genres,
        genres::get_genre,
        genres::genre_create_form,
        genres::create_genre,
        genres::update_genre,
        genres::delete_genre,
        genres::list_languages,
        genres::get_language,
        genres::language_create_form,
        genres::create_language,
        genres::update_language,
        genres::delete_language,
        book_instances::list_book_instances,
        book_instances::get_book_instance,
        book_instances::create_form,
        book_instances::create_book_instance,
        book_instances::update_book_instance,
        book_instances::delete_book_instance,
        // Loans
        loans::my_borrowed,
        loans::all_borrowed,
        loans::renew_form,
        loans::renew,
    ),
    components(
        schemas(
            // Accounts
            auth::LoginFormResponse,
            auth::LoginRequest,
            auth::LoginResponse,
            crate::models::user::User,
            crate::models::user::UserShort,
            crate::models::user::CreateUser,
            // Catalog
            crate::services::catalog::IndexStats,
            crate::models::author::Author,
            crate::models::author::AuthorDetails,
            crate::models::author::AuthorForm,
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookDetails,
            crate::models::book::BookForm,
            crate::models::genre::Genre,
            crate::models::genre::GenreDetails,
            crate::models::genre::Language,
            crate::models::genre::NameForm,
            crate::models::book_instance::LoanStatus,
            crate::models::book_instance::BookInstance,
            crate::models::book_instance::BookInstanceView,
            crate::models::book_instance::BookInstanceForm,
            crate::models::pagination::AuthorPage,
            crate::models::pagination::BookPage,
            crate::models::pagination::BookInstancePage,
            // Renewal
            crate::services::renewal::RenewBookForm,
            crate::services::renewal::RenewalFormState,
            crate::services::renewal::RenewalPage,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, logout and accounts"),
        (name = "catalog", description = "Catalog home"),
        (name = "books", description = "Books"),
        (name = "authors", description = "Authors"),
        (name = "genres", description = "Genres"),
        (name = "languages", description = "Languages"),
        (name = "bookinstances", description = "Physical copies"),
        (name = "loans", description = "Borrowed copies and renewals")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
