//! User data models

use serde::{Deserialize, Serialize};

use super::auth::PasswordHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// The projection of an identity that is safe to embed in responses,
/// e.g. as the expanded author of a comment.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
}

/// Everything needed to check a login attempt for one username.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: i64,
    pub role: UserRole,
    pub salt: String,
    pub hash: String,
    pub hasher: PasswordHasher,
}

/// Freshly hashed password material for a new registration.
#[derive(Debug, Clone)]
pub struct NewPasswordCredentials {
    pub salt: String,
    pub hash: String,
    pub hasher: PasswordHasher,
}
