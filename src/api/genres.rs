//! Genre and language endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        form::FormSchema,
        genre::{Genre, GenreDetails, Language, NameForm},
        user::{Action, Entity, Permission},
    },
    services::catalog::CatalogService,
    AppState,
};

use super::{created, object_id, AuthenticatedUser, Created, JsonOrForm};

/// List genres ordered by name
#[utoipa::path(
    get,
    path = "/catalog/genres/",
    tag = "genres",
    responses(
        (status = 200, description = "All genres", body = Vec<Genre>)
    )
)]
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    let genres = state.services.catalog.list_genres().await?;
    Ok(Json(genres))
}

/// Get a genre with its books
#[utoipa::path(
    get,
    path = "/catalog/genre/{id}",
    tag = "genres",
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 200, description = "Genre details", body = GenreDetails),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<GenreDetails>> {
    let id = object_id(&id, "Genre")?;
    let genre = state.services.catalog.get_genre(id).await?;
    Ok(Json(genre))
}

#[utoipa::path(
    get,
    path = "/catalog/genre/create/",
    tag = "genres",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fields and help texts"),
        (status = 403, description = "Permission catalog.add_genre required")
    )
)]
pub async fn genre_create_form(
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FormSchema>> {
    claims.require(Permission::Model(Action::Add, Entity::Genre))?;
    Ok(Json(CatalogService::form_schema(Entity::Genre)))
}

/// Create a genre; names are unique ignoring case
#[utoipa::path(
    post,
    path = "/catalog/genre/create/",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = NameForm,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 403, description = "Permission catalog.add_genre required"),
        (status = 409, description = "Genre already exists (case insensitive match)")
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonOrForm(form): JsonOrForm<NameForm>,
) -> AppResult<Created<Genre>> {
    claims.require(Permission::Model(Action::Add, Entity::Genre))?;

    let genre = state.services.catalog.create_genre(form).await?;
    Ok(created(genre.absolute_url(), genre))
}

#[utoipa::path(
    post,
    path = "/catalog/genre/{id}/update/",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    request_body = NameForm,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 404, description = "Genre not found"),
        (status = 409, description = "Genre already exists (case insensitive match)")
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    JsonOrForm(form): JsonOrForm<NameForm>,
) -> AppResult<Json<Genre>> {
    claims.require(Permission::Model(Action::Change, Entity::Genre))?;

    let id = object_id(&id, "Genre")?;
    let genre = state.services.catalog.update_genre(id, form).await?;
    Ok(Json(genre))
}

#[utoipa::path(
    post,
    path = "/catalog/genre/{id}/delete/",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Genre ID")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 404, description = "Genre not found")
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    claims.require(Permission::Model(Action::Delete, Entity::Genre))?;

    let id = object_id(&id, "Genre")?;
    state.services.catalog.delete_genre(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List languages ordered by name
#[utoipa::path(
    get,
    path = "/catalog/languages/",
    tag = "languages",
    responses(
        (status = 200, description = "All languages", body = Vec<Language>)
    )
)]
pub async fn list_languages(State(state): State<AppState>) -> AppResult<Json<Vec<Language>>> {
    let languages = state.services.catalog.list_languages().await?;
    Ok(Json(languages))
}

#[utoipa::path(
    get,
    path = "/catalog/language/{id}",
    tag = "languages",
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 200, description = "Language", body = Language),
        (status = 404, description = "Language not found")
    )
)]
pub async fn get_language(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Language>> {
    let id = object_id(&id, "Language")?;
    let language = state.services.catalog.get_language(id).await?;
    Ok(Json(language))
}

#[utoipa::path(
    get,
    path = "/catalog/language/create/",
    tag = "languages",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Fields and help texts"),
        (status = 403, description = "Permission catalog.add_language required")
    )
)]
pub async fn language_create_form(
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<FormSchema>> {
    claims.require(Permission::Model(Action::Add, Entity::Language))?;
    Ok(Json(CatalogService::form_schema(Entity::Language)))
}

#[utoipa::path(
    post,
    path = "/catalog/language/create/",
    tag = "languages",
    security(("bearer_auth" = [])),
    request_body = NameForm,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 403, description = "Permission catalog.add_language required"),
        (status = 409, description = "Language already exists (case insensitive match)")
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonOrForm(form): JsonOrForm<NameForm>,
) -> AppResult<Created<Language>> {
    claims.require(Permission::Model(Action::Add, Entity::Language))?;

    let language = state.services.catalog.create_language(form).await?;
    Ok(created(language.absolute_url(), language))
}

#[utoipa::path(
    post,
    path = "/catalog/language/{id}/update/",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    request_body = NameForm,
    responses(
        (status = 200, description = "Language updated", body = Language),
        (status = 404, description = "Language not found"),
        (status = 409, description = "Language already exists (case insensitive match)")
    )
)]
pub async fn update_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
    JsonOrForm(form): JsonOrForm<NameForm>,
) -> AppResult<Json<Language>> {
    claims.require(Permission::Model(Action::Change, Entity::Language))?;

    let id = object_id(&id, "Language")?;
    let language = state.services.catalog.update_language(id, form).await?;
    Ok(Json(language))
}

#[utoipa::path(
    post,
    path = "/catalog/language/{id}/delete/",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Language ID")),
    responses(
        (status = 204, description = "Language deleted"),
        (status = 404, description = "Language not found")
    )
)]
pub async fn delete_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    claims.require(Permission::Model(Action::Delete, Entity::Language))?;

    let id = object_id(&id, "Language")?;
    state.services.catalog.delete_language(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
