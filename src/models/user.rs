//! User accounts, permissions, and JWT claims

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Catalog entity types that carry model permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Author,
    Book,
    BookInstance,
    Genre,
    Language,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Entity::Author => "author",
            Entity::Book => "book",
            Entity::BookInstance => "bookinstance",
            Entity::Genre => "genre",
            Entity::Language => "language",
        }
    }

    pub const ALL: [Entity; 5] = [
        Entity::Author,
        Entity::Book,
        Entity::BookInstance,
        Entity::Genre,
        Entity::Language,
    ];
}

/// Write actions on a catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Add,
    Change,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Add => "add",
            Action::Change => "change",
            Action::Delete => "delete",
        }
    }

    pub const ALL: [Action; 3] = [Action::Add, Action::Change, Action::Delete];
}

/// A grantable permission, serialized as `catalog.<codename>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Librarian right: renew loans and see every borrowed copy
    CanMarkReturned,
    Model(Action, Entity),
}

impl Permission {
    pub fn codename(&self) -> String {
        match self {
            Permission::CanMarkReturned => "can_mark_returned".to_string(),
            Permission::Model(action, entity) => {
                format!("{}_{}", action.as_str(), entity.as_str())
            }
        }
    }

    /// Every known permission
    pub fn all() -> Vec<Permission> {
        let mut all = vec![Permission::CanMarkReturned];
        for entity in Entity::ALL {
            for action in Action::ALL {
                all.push(Permission::Model(action, entity));
            }
        }
        all
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "catalog.{}", self.codename())
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let codename = s.strip_prefix("catalog.").unwrap_or(s);
        Permission::all()
            .into_iter()
            .find(|p| p.codename() == codename)
            .ok_or_else(|| format!("Unknown permission: {}", s))
    }
}

/// Full user model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    /// Permission strings in `catalog.<codename>` form
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Short user representation embedded in loan listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct UserShort {
    pub id: i32,
    pub username: String,
}

/// Create user request (superuser only)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,
    #[serde(default)]
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[serde(default)]
    pub is_superuser: bool,
    /// Permission strings, e.g. `catalog.can_mark_returned`
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub is_superuser: bool,
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    fn granted(&self) -> HashSet<Permission> {
        self.permissions
            .iter()
            .filter_map(|p| p.parse().ok())
            .collect()
    }

    /// Superusers hold every permission
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_superuser || self.granted().contains(&permission)
    }

    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!("Permission {} required", permission)))
        }
    }

    pub fn require_superuser(&self) -> Result<(), AppError> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(AppError::Authorization("Superuser privileges required".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(permissions: &[&str], is_superuser: bool) -> UserClaims {
        UserClaims {
            sub: "testuser".into(),
            user_id: 1,
            is_superuser,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_permission_codenames() {
        assert_eq!(Permission::CanMarkReturned.to_string(), "catalog.can_mark_returned");
        assert_eq!(
            Permission::Model(Action::Add, Entity::BookInstance).to_string(),
            "catalog.add_bookinstance"
        );
        assert_eq!(
            "catalog.delete_author".parse::<Permission>(),
            Ok(Permission::Model(Action::Delete, Entity::Author))
        );
        assert_eq!(
            "change_genre".parse::<Permission>(),
            Ok(Permission::Model(Action::Change, Entity::Genre))
        );
        assert!("catalog.fly".parse::<Permission>().is_err());
    }

    #[test]
    fn test_has_permission() {
        let librarian = claims(&["catalog.can_mark_returned"], false);
        assert!(librarian.has_permission(Permission::CanMarkReturned));
        assert!(!librarian.has_permission(Permission::Model(Action::Add, Entity::Author)));
        assert!(librarian.require(Permission::Model(Action::Add, Entity::Author)).is_err());

        let reader = claims(&[], false);
        assert!(!reader.has_permission(Permission::CanMarkReturned));

        let admin = claims(&[], true);
        assert!(admin.has_permission(Permission::CanMarkReturned));
        assert!(admin.require_superuser().is_ok());
    }

    #[test]
    fn test_token_round_trip() {
        let mut original = claims(&["catalog.can_mark_returned"], false);
        original.exp = Utc::now().timestamp() + 3600;
        let token = original.create_token("secret").unwrap();
        let decoded = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(decoded.user_id, 1);
        assert_eq!(decoded.permissions, original.permissions);
        assert!(UserClaims::from_token(&token, "other").is_err());
    }
}
