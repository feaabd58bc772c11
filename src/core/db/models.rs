//! Database models for blogforge
//!
//! This module defines the database entity structs that map to PostgreSQL tables.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Model
// ============================================================================

/// Capability tag granted to a user.
///
/// Stored as a PostgreSQL enum; a user holds a set of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

/// User entity representing a registered account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub roles: Vec<Role>,
    pub profile_photo_url: Option<String>,
    pub profile_photo_public_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User without sensitive data (for API responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub profile_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            roles: user.roles,
            profile_photo_url: user.profile_photo_url,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Refresh Token Model
// ============================================================================

/// Persisted refresh token record.
///
/// Only the SHA-256 hash of the opaque value is stored; the raw value exists
/// solely in the client's cookie. Linked to the owning user by username
/// value, not by foreign key.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub token_hash: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Blog Model
// ============================================================================

/// Blog post entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Blog {
    pub id: Uuid,
    pub author_username: String,
    pub topic: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Blog data for creation (author comes from the request identity)
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBlog {
    pub topic: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub content: String,
}

/// Blog data for updates
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateBlog {
    pub topic: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub content: Option<String>,
}
