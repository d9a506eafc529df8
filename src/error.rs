//! Error types for the LocalLibrary server

use axum::{
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable error codes exposed in error bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthenticated = 2,
    NotAuthorized = 3,
    DbFailure = 4,
    NoSuchObject = 5,
    Duplicate = 6,
    BadValue = 7,
    ProtectedObject = 8,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No valid session; the caller is sent to the login page and brought back to `next`
    #[error("Login required to access {next}")]
    LoginRequired { login_url: String, next: String },

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Delete refused because other records still point at the object
    #[error("Protected: {0}")]
    Protected(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

/// Build the login redirect target, keeping slashes readable as in `/accounts/login/?next=/catalog/mybooks/`
pub fn login_redirect_url(login_url: &str, next: &str) -> String {
    format!("{}?next={}", login_url, urlencoding::encode(next).replace("%2F", "/"))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::LoginRequired { login_url, next } => {
                let location = login_redirect_url(login_url, next);
                return (StatusCode::FOUND, [(LOCATION, location)]).into_response();
            }
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthenticated, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchObject, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::Protected(msg) => {
                (StatusCode::CONFLICT, ErrorCode::ProtectedObject, msg.clone())
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Map Postgres constraint violations onto caller-facing errors.
///
/// Unique violations become [`AppError::Conflict`] with `duplicate_message`;
/// foreign-key violations raised by RESTRICT deletes become [`AppError::Protected`].
pub fn map_constraint_error(err: sqlx::Error, duplicate_message: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        match db_err.code().as_deref() {
            Some("23505") => return AppError::Conflict(duplicate_message.to_string()),
            Some("23503") => {
                return AppError::Protected(
                    "Object is referenced by other records and cannot be changed".to_string(),
                )
            }
            _ => {}
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_redirect_keeps_path_readable() {
        assert_eq!(
            login_redirect_url("/accounts/login/", "/catalog/mybooks/"),
            "/accounts/login/?next=/catalog/mybooks/"
        );
    }

    #[test]
    fn test_login_redirect_encodes_query() {
        assert_eq!(
            login_redirect_url("/accounts/login/", "/catalog/books/?page=2"),
            "/accounts/login/?next=/catalog/books/%3Fpage%3D2"
        );
    }

    #[test]
    fn test_status_mapping() {
        let forbidden = AppError::Authorization("nope".into()).into_response();
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        let missing = AppError::NotFound("gone".into()).into_response();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let login = AppError::LoginRequired {
            login_url: "/accounts/login/".into(),
            next: "/catalog/borrowed/".into(),
        }
        .into_response();
        assert_eq!(login.status(), StatusCode::FOUND);
        assert_eq!(
            login.headers().get(LOCATION).unwrap(),
            "/accounts/login/?next=/catalog/borrowed/"
        );
    }

    #[tokio::test]
    async fn test_protected_delete_body() {
        let response =
            AppError::Protected("Author cannot be deleted while books reference them".into())
                .into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 8);
        assert_eq!(body["error"], "ProtectedObject");
    }
}
