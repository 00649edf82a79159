//! User model
//!
//! This module defines the User entity and related types for the back-office.
//! Only village staff have accounts: there is no public registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::InvalidValue;

/// Back-office account.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (unique, used to log in)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// User role
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed with `services::password::hash_password()`.
    pub fn new(name: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            name,
            email,
            password_hash,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// User role for authorization.
///
/// - Admin: content plus account management
/// - Editor: content only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Editor,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = InvalidValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "editor" => Ok(UserRole::Editor),
            _ => Err(InvalidValue::new("user role", s)),
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = InvalidValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    /// Plaintext password (will be hashed)
    pub password: String,
    /// Defaults to Editor
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// Input for updating a user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    /// New password (will be hashed)
    pub password: Option<String>,
    pub role: Option<UserRole>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "Sekretaris Desa".to_string(),
            "sekdes@banyuanyar.desa.id".to_string(),
            "hashed_password".to_string(),
            UserRole::Editor,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.name, "Sekretaris Desa");
        assert!(!user.is_admin());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new(
            "Admin".to_string(),
            "admin@banyuanyar.desa.id".to_string(),
            "$argon2id$secret".to_string(),
            UserRole::Admin,
        );
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"role\":\"admin\""));
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::from_str("EDITOR").unwrap(), UserRole::Editor);
        assert!(UserRole::from_str("author").is_err());
        assert_eq!(UserRole::try_from("editor".to_string()).unwrap(), UserRole::Editor);
    }

    #[test]
    fn test_user_role_default() {
        assert_eq!(UserRole::default(), UserRole::Editor);
        assert_eq!(UserRole::Admin.to_string(), "admin");
    }
}
