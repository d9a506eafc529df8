//! Account endpoints: login, logout, user creation

use axum::{
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::AppResult,
    models::user::{CreateUser, User},
    services::auth::is_local_redirect,
    AppState,
};

use super::{AuthenticatedUser, JsonOrForm, SESSION_COOKIE};

/// `?next=` on the login page
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextQuery {
    /// Path to return to after logging in
    pub next: Option<String>,
}

/// Login form description
#[derive(Serialize, ToSchema)]
pub struct LoginFormResponse {
    pub fields: Vec<String>,
    pub next: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    /// Local path to redirect to on success
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    pub user: User,
}

/// Describe the login form
#[utoipa::path(
    get,
    path = "/accounts/login/",
    tag = "auth",
    params(NextQuery),
    responses(
        (status = 200, description = "Login form", body = LoginFormResponse)
    )
)]
pub async fn login_form(Query(query): Query<NextQuery>) -> Json<LoginFormResponse> {
    Json(LoginFormResponse {
        fields: vec!["username".to_string(), "password".to_string()],
        next: query.next,
    })
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/accounts/login/",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 302, description = "Logged in, redirected to `next`"),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonOrForm(request): JsonOrForm<LoginRequest>,
) -> AppResult<Response> {
    let (token, user) = state
        .services
        .auth
        .authenticate(&request.username, &request.password)
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    let jar = jar.add(cookie);

    if let Some(next) = request.next.filter(|next| is_local_redirect(next)) {
        return Ok((StatusCode::FOUND, jar, [(LOCATION, next)]).into_response());
    }

    Ok((
        jar,
        Json(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: state.services.auth.token_ttl_seconds(),
            user,
        }),
    )
        .into_response())
}

/// Log out, clearing the session cookie
#[utoipa::path(
    post,
    path = "/accounts/logout/",
    tag = "auth",
    responses(
        (status = 204, description = "Logged out")
    )
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

/// Create a user account (superuser only)
#[utoipa::path(
    post,
    path = "/accounts/users/",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid payload or unknown permission"),
        (status = 403, description = "Superuser privileges required"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    JsonOrForm(user): JsonOrForm<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_superuser()?;

    let created = state.services.auth.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
