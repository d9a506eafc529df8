//! Book instance (copy) endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstance, BookInstanceForm, BookInstanceView},
        form::FormSchema,
        pagination::{PageQuery, Paginated},
        user::{Action, Entity, Permission},
    },
    services::catalog::CatalogService,
    AppState,
};

use super::{created, object_id, AuthenticatedUser, Created, JsonOrForm};

/// List copies ordered by due date
#[utoipa::path(
    get,
    path = "/catalog/bookinstances/",
    tag = "bookinstances",
    params(PageQuery),
    responses(
        (status = 200, description = "Page of copies", body = crate::models::pagination::BookInstancePage),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_book_instances(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<BookInstanceView>>> {
    let page = state.services.catalog.list_book_instances(query.page).await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/catalog/bookinstance/{id}",
    tag = "bookinstances",
    params(("id" = Uuid, Path, description = "Copy ID")),
    responses(
        (status = 200, description = "Copy details", body = BookInstanceView),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn get_book_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BookInstanceView>> {
    let id: Uuid = object_id(&id, "Book instance")?;
    let copy = state.services.catalog.get_book_instance(id).await?;
    Ok(Json(copy))
}

/// Blank copy form
#[utoipa::path(
    get,
    path = "/catalog/bookinstance/create/",
    tag = "bookinstances",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fields and initial values"),
        (status = 302, description = "Login required"),
        (status = 403, description = "Permission catalog.add_bookinstance required")
    )
)]
pub async fn create_form(AuthenticatedUser(claims): AuthenticatedUser) -> AppResult<Json<FormSchema>> {
    claims.require(Permission::Model(Action::Add, Entity::BookInstance))?;
    Ok(Json(CatalogService::form_schema(Entity::BookInstance)))
}

/// Create a copy; its identifier is generated
#[utoipa::path(
    post,
    path = "/catalog/bookinstance/create/",
    tag = "bookinstances",
    security(("bearer_auth" = [])),
    request_body = BookInstanceForm,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 400, description = "Invalid payload or unknown book or borrower"),
        (status = 403, description = "Permission catalog.add_bookinstance required")
    )
)]
pub async fn create_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonOrForm(form): JsonOrForm<BookInstanceForm>,
) -> AppResult<Created<BookInstance>> {
    claims.require(Permission::Model(Action::Add, Entity::BookInstance))?;

    let copy = state.services.catalog.create_book_instance(form).await?;
    Ok(created(copy.absolute_url(), copy))
}

#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/update/",
    tag = "bookinstances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Copy ID")),
    request_body = BookInstanceForm,
    responses(
        (status = 200, description = "Copy updated", body = BookInstance),
        (status = 403, description = "Permission catalog.change_bookinstance required"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn update_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    JsonOrForm(form): JsonOrForm<BookInstanceForm>,
) -> AppResult<Json<BookInstance>> {
    claims.require(Permission::Model(Action::Change, Entity::BookInstance))?;

    let id: Uuid = object_id(&id, "Book instance")?;
    let copy = state.services.catalog.update_book_instance(id, form).await?;
    Ok(Json(copy))
}

#[utoipa::path(
    post,
    path = "/catalog/bookinstance/{id}/delete/",
    tag = "bookinstances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Copy ID")),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 403, description = "Permission catalog.delete_bookinstance required"),
        (status = 404, description = "Copy not found")
    )
)]
pub async fn delete_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    claims.require(Permission::Model(Action::Delete, Entity::BookInstance))?;

    let id: Uuid = object_id(&id, "Book instance")?;
    state.services.catalog.delete_book_instance(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
