//! Author endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        author::{Author, AuthorDetails, AuthorForm},
        form::FormSchema,
        pagination::{PageQuery, Paginated},
        user::{Action, Entity, Permission},
    },
    services::catalog::CatalogService,
    AppState,
};

use super::{created, object_id, AuthenticatedUser, Created, JsonOrForm};

/// List authors, 5 per page
#[utoipa::path(
    get,
    path = "/catalog/authors/",
    tag = "authors",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of authors", body = crate::models::pagination::AuthorPage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<Author>>> {
    let page = state.services.catalog.list_authors(query.page).await?;
    Ok(Json(page))
}

/// Get an author with their books
#[utoipa::path(
    get,
    path = "/catalog/author/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = AuthorDetails),
        (status = 404, description = "Author not found")
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<AuthorDetails>> {
    let id = object_id(&id, "Author")?;
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(author))
}

/// Blank author form
#[utoipa::path(
    get,
    path = "/catalog/author/create/",
    tag = "authors",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fields and initial values"),
        (status = 302, description = "Login required"),
        (status = 403, description = "Permission catalog.add_author required")
    )
)]
pub async fn create_form(AuthenticatedUser(claims): AuthenticatedUser) -> AppResult<Json<FormSchema>> {
    claims.require(Permission::Model(Action::Add, Entity::Author))?;
    Ok(Json(CatalogService::form_schema(Entity::Author)))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/catalog/author/create/",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorForm,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Permission catalog.add_author required")
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonOrForm(form): JsonOrForm<AuthorForm>,
) -> AppResult<Created<Author>> {
    claims.require(Permission::Model(Action::Add, Entity::Author))?;

    let author = state.services.catalog.create_author(form).await?;
    Ok(created(author.absolute_url(), author))
}

/// Update an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/update/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorForm,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 403, description = "Permission catalog.change_author required"),
        (status = 404, description = "Author not found")
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    JsonOrForm(form): JsonOrForm<AuthorForm>,
) -> AppResult<Json<Author>> {
    claims.require(Permission::Model(Action::Change, Entity::Author))?;

    let id = object_id(&id, "Author")?;
    let author = state.services.catalog.update_author(id, form).await?;
    Ok(Json(author))
}

/// Delete an author
#[utoipa::path(
    post,
    path = "/catalog/author/{id}/delete/",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 403, description = "Permission catalog.delete_author required"),
        (status = 404, description = "Author not found"),
        (status = 409, description = "Author still has books")
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    claims.require(Permission::Model(Action::Delete, Entity::Author))?;

    let id = object_id(&id, "Author")?;
    state.services.catalog.delete_author(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
