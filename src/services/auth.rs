//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, Permission, User, UserClaims},
    repository::Repository,
};

/// Username of the superuser created on first start
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    pub fn login_url(&self) -> &str {
        &self.config.login_url
    }

    /// Lifetime of issued tokens, in seconds
    pub fn token_ttl_seconds(&self) -> i64 {
        self.config.jwt_expiration_hours as i64 * 3600
    }

    /// Authenticate by username and password and return a JWT token
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .repository
            .users
            .get_by_username(username)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user.password_hash, password)? {
            tracing::info!(username = %username, "Rejected login");
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok((token, user))
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: user.username.clone(),
            user_id: user.id,
            is_superuser: user.is_superuser,
            permissions: user.permissions.clone(),
            exp: now + self.token_ttl_seconds(),
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Decode and verify a token; `None` when it is invalid or expired
    pub fn decode_token(&self, token: &str) -> Option<UserClaims> {
        match UserClaims::from_token(token, &self.config.jwt_secret) {
            Ok(claims) => Some(claims),
            Err(e) => {
                tracing::debug!("Ignoring invalid token: {}", e);
                None
            }
        }
    }

    /// Create a new user (superuser only)
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        user.validate()?;

        let permissions = normalize_permissions(&user.permissions)?;

        if self.repository.users.username_exists(&user.username).await? {
            return Err(AppError::Conflict(
                "A user with that username already exists".to_string(),
            ));
        }

        let password_hash = hash_password(&user.password)?;
        let created = self
            .repository
            .users
            .create(&user, &password_hash, &permissions)
            .await?;

        tracing::info!(user_id = created.id, username = %created.username, "Created user");
        Ok(created)
    }

    /// Create the `admin` superuser when a bootstrap password is configured and no user exists yet
    pub async fn ensure_bootstrap_admin(&self) -> AppResult<Option<User>> {
        let Some(password) = self.config.bootstrap_admin_password.clone() else {
            return Ok(None);
        };

        if self.repository.users.count().await? > 0 {
            return Ok(None);
        }

        let admin = self
            .create_user(CreateUser {
                username: BOOTSTRAP_ADMIN_USERNAME.to_string(),
                password,
                first_name: String::new(),
                last_name: String::new(),
                email: None,
                is_superuser: true,
                permissions: Vec::new(),
            })
            .await?;

        tracing::warn!("Created bootstrap superuser '{}'", BOOTSTRAP_ADMIN_USERNAME);
        Ok(Some(admin))
    }
}

/// Parse permission strings, returning them in `catalog.<codename>` form without duplicates
pub fn normalize_permissions(raw: &[String]) -> AppResult<Vec<String>> {
    let mut normalized: Vec<String> = Vec::with_capacity(raw.len());
    for value in raw {
        let permission: Permission = value.trim().parse().map_err(AppError::BadRequest)?;
        let value = permission.to_string();
        if !normalized.contains(&value) {
            normalized.push(value);
        }
    }
    Ok(normalized)
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// True for a same-site path such as `/catalog/mybooks/`.
///
/// Scheme-relative (`//host`) and absolute URLs are refused.
pub fn is_local_redirect(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("1X<ISRUkw+tuK").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "1X<ISRUkw+tuK").unwrap());
        assert!(!verify_password(&hash, "2HJ1vRV0Z&3iD").unwrap());
        assert!(verify_password("not-a-hash", "x").is_err());
    }

    #[test]
    fn test_normalize_permissions() {
        let raw = vec![
            "can_mark_returned".to_string(),
            "catalog.can_mark_returned".to_string(),
            " catalog.add_author ".to_string(),
        ];
        assert_eq!(
            normalize_permissions(&raw).unwrap(),
            vec!["catalog.can_mark_returned", "catalog.add_author"]
        );

        let err = normalize_permissions(&["catalog.fly".to_string()]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_is_local_redirect() {
        assert!(is_local_redirect("/catalog/mybooks/"));
        assert!(!is_local_redirect("//evil.example/"));
        assert!(!is_local_redirect("https://evil.example/"));
        assert!(!is_local_redirect("/\\evil.example"));
        assert!(!is_local_redirect(""));
    }
}
