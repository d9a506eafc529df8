//! API handlers for the LocalLibrary endpoints

pub mod auth;
pub mod authors;
pub mod book_instances;
pub mod books;
pub mod catalog;
pub mod genres;
pub mod health;
pub mod loans;
pub mod openapi;

use std::str::FromStr;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, OriginalUri, Request},
    http::{
        header::{HeaderName, AUTHORIZATION, CONTENT_TYPE, LOCATION},
        request::Parts,
        StatusCode,
    },
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::de::DeserializeOwned;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::UserClaims, AppState};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "sessionid";

/// Extractor for the caller, if any.
///
/// The token is read from `Authorization: Bearer` first, then from the
/// session cookie. Invalid or expired tokens count as anonymous.
pub struct MaybeUser(pub Option<UserClaims>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = bearer.or_else(|| {
            CookieJar::from_headers(&parts.headers)
                .get(SESSION_COOKIE)
                .map(|cookie| cookie.value().to_string())
        });

        let claims = token.and_then(|token| state.services.auth.decode_token(&token));
        Ok(MaybeUser(claims))
    }
}

/// Extractor for an authenticated user; anonymous callers are sent to the login page
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let MaybeUser(claims) = MaybeUser::from_request_parts(parts, state).await?;
        claims.map(AuthenticatedUser).ok_or_else(|| AppError::LoginRequired {
            login_url: state.services.auth.login_url().to_string(),
            next: request_origin(parts),
        })
    }
}

/// Path and query the client asked for, before any nesting was stripped
pub fn request_origin(parts: &Parts) -> String {
    let uri = parts
        .extensions
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or(&parts.uri);
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Body extractor accepting JSON or `application/x-www-form-urlencoded`
pub struct JsonOrForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(JsonOrForm(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(JsonOrForm(value))
        }
    }
}

/// `201 Created` with a `Location` header pointing at the new object
pub type Created<T> = (StatusCode, [(HeaderName, String); 1], Json<T>);

pub fn created<T>(location: String, body: T) -> Created<T> {
    (StatusCode::CREATED, [(LOCATION, location)], Json(body))
}

/// Parse a path identifier; anything unparsable is an unknown object
pub fn object_id<T: FromStr>(raw: &str, label: &str) -> Result<T, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound(format!("{} {} not found", label, raw)))
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Accounts
        .route("/accounts/login/", get(auth::login_form).post(auth::login))
        .route("/accounts/logout/", post(auth::logout))
        .route("/accounts/users/", post(auth::create_user))
        // Catalog home
        .route("/catalog/", get(catalog::index))
        // Books
        .route("/catalog/books/", get(books::list_books))
        .route("/catalog/book/create/", get(books::create_form).post(books::create_book))
        .route("/catalog/book/:id", get(books::get_book))
        .route("/catalog/book/:id/update/", post(books::update_book))
        .route("/catalog/book/:id/delete/", post(books::delete_book))
        .route("/catalog/book/:id/renew/", get(loans::renew_form).post(loans::renew))
        // Authors
        .route("/catalog/authors/", get(authors::list_authors))
        .route("/catalog/author/create/", get(authors::create_form).post(authors::create_author))
        .route("/catalog/author/:id", get(authors::get_author))
        .route("/catalog/author/:id/update/", post(authors::update_author))
        .route("/catalog/author/:id/delete/", post(authors::delete_author))
        // Genres
        .route("/catalog/genres/", get(genres::list_genres))
        .route("/catalog/genre/create/", get(genres::genre_create_form).post(genres::create_genre))
        .route("/catalog/genre/:id", get(genres::get_genre))
        .route("/catalog/genre/:id/update/", post(genres::update_genre))
        .route("/catalog/genre/:id/delete/", post(genres::delete_genre))
        // Languages
        .route("/catalog/languages/", get(genres::list_languages))
        .route(
            "/catalog/language/create/",
            get(genres::language_create_form).post(genres::create_language),
        )
        .route("/catalog/language/:id", get(genres::get_language))
        .route("/catalog/language/:id/update/", post(genres::update_language))
        .route("/catalog/language/:id/delete/", post(genres::delete_language))
        // Copies
        .route("/catalog/bookinstances/", get(book_instances::list_book_instances))
        .route(
            "/catalog/bookinstance/create/",
            get(book_instances::create_form).post(book_instances::create_book_instance),
        )
        .route("/catalog/bookinstance/:id", get(book_instances::get_book_instance))
        .route("/catalog/bookinstance/:id/update/", post(book_instances::update_book_instance))
        .route("/catalog/bookinstance/:id/delete/", post(book_instances::delete_book_instance))
        // Loans
        .route("/catalog/mybooks/", get(loans::my_borrowed))
        .route("/catalog/borrowed/", get(loans::all_borrowed))
        .with_state(state);

    app.merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
