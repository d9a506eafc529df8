//! Book endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookDetails, BookForm, BookSummary},
        form::FormSchema,
        pagination::{PageQuery, Paginated},
        user::{Action, Entity, Permission},
    },
    services::catalog::CatalogService,
    AppState,
};

use super::{created, object_id, AuthenticatedUser, Created, JsonOrForm};

/// List books ordered by title, 5 per page
#[utoipa::path(
    get,
    path = "/catalog/books/",
    tag = "books",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of books", body = crate::models::pagination::BookPage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<BookSummary>>> {
    let page = state.services.catalog.list_books(query.page).await?;
    Ok(Json(page))
}

/// Get a book with its author, genres, language and copies
#[utoipa::path(
    get,
    path = "/catalog/book/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookDetails>> {
    let id = object_id(&id, "Book")?;
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(book))
}

/// Blank book form
#[utoipa::path(
    get,
    path = "/catalog/book/create/",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fields and initial values"),
        (status = 302, description = "Login required"),
        (status = 403, description = "Permission catalog.add_book required")
    )
)]
pub async fn create_form(AuthenticatedUser(claims): AuthenticatedUser) -> AppResult<Json<FormSchema>> {
    claims.require(Permission::Model(Action::Add, Entity::Book))?;
    Ok(Json(CatalogService::form_schema(Entity::Book)))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/catalog/book/create/",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = BookForm,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid payload or unknown author, language or genre"),
        (status = 403, description = "Permission catalog.add_book required"),
        (status = 409, description = "ISBN already catalogued")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonOrForm(form): JsonOrForm<BookForm>,
) -> AppResult<Created<Book>> {
    claims.require(Permission::Model(Action::Add, Entity::Book))?;

    let book = state.services.catalog.create_book(form).await?;
    Ok(created(book.absolute_url(), book))
}

/// Update a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/update/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookForm,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 403, description = "Permission catalog.change_book required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "ISBN already catalogued")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    JsonOrForm(form): JsonOrForm<BookForm>,
) -> AppResult<Json<Book>> {
    claims.require(Permission::Model(Action::Change, Entity::Book))?;

    let id = object_id(&id, "Book")?;
    let book = state.services.catalog.update_book(id, form).await?;
    Ok(Json(book))
}

/// Delete a book
#[utoipa::path(
    post,
    path = "/catalog/book/{id}/delete/",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Permission catalog.delete_book required"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Copies of the book still exist")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    claims.require(Permission::Model(Action::Delete, Entity::Book))?;

    let id = object_id(&id, "Book")?;
    state.services.catalog.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
