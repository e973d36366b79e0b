// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::Id;

/// Represents the 'users' table in the database.
/// Rows are provisioned by the identity provider on first sign-in.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: Id,

    /// Name reported by the OAuth provider.
    pub name: String,

    /// Handle chosen by the user. Unique when set.
    pub username: Option<String>,

    /// Avatar URL from the OAuth provider.
    pub image: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// The chosen username, falling back to the provider name.
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.name)
    }
}

/// Author identity embedded in comment nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Id,
    pub display_name: String,
}

/// Profile of the current user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub id: Id,
    pub name: String,
    pub username: Option<String>,
    pub display_name: String,
    pub image: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            display_name: user.display_name().to_owned(),
            id: user.id,
            name: user.name,
            username: user.username,
            image: user.image,
            created_at: user.created_at,
        }
    }
}

/// DTO for choosing a username.
#[derive(Debug, Deserialize, Validate)]
pub struct SetUsernameRequest {
    #[validate(length(min = 1, max = 64, message = "Username is required"))]
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SetUsernameResponse {
    pub success: bool,
    pub username: String,
}
