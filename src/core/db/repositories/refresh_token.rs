//! Refresh token repository
//!
//! Handles storage and lifecycle of opaque refresh tokens. Values are
//! generated from a cryptographically strong random source and stored as
//! SHA-256 hashes; expired records are removed lazily when looked up.

use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::core::db::models::RefreshToken;

/// Number of random bytes in a token value (hex-encoded to 64 chars)
const TOKEN_BYTES: usize = 32;

/// Default refresh token duration (7 days)
const DEFAULT_TOKEN_DURATION_DAYS: i64 = 7;

/// Refresh token repository error types
#[derive(Debug, thiserror::Error)]
pub enum RefreshTokenRepositoryError {
    #[error("User not found for refresh token creation")]
    UnknownUser,

    #[error("Refresh token has expired")]
    Expired,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// A freshly created refresh token: the raw value for the client plus the
/// persisted record. The raw value is never stored and cannot be recovered.
#[derive(Debug, Clone)]
pub struct IssuedRefreshToken {
    pub value: String,
    pub record: RefreshToken,
}

/// Refresh token repository for database operations
#[derive(Clone)]
pub struct RefreshTokenRepository {
    pool: PgPool,
}

impl RefreshTokenRepository {
    /// Create a new refresh token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Generate a new opaque token value from a CSPRNG
    pub fn generate_value() -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Hash a token value using SHA-256
    pub fn hash_value(value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Create a refresh token for the given user.
    ///
    /// Fails with `UnknownUser` when the username does not reference an
    /// existing user. Expiry is `now + duration_days` (default 7).
    pub async fn create(
        &self,
        username: &str,
        duration_days: Option<i64>,
    ) -> Result<IssuedRefreshToken, RefreshTokenRepositoryError> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        if !exists.0 {
            return Err(RefreshTokenRepositoryError::UnknownUser);
        }

        let value = Self::generate_value();
        let token_hash = Self::hash_value(&value);
        let duration = duration_days.unwrap_or(DEFAULT_TOKEN_DURATION_DAYS);
        let expires_at = Utc::now() + Duration::days(duration);

        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token_hash, username, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, token_hash, username, expires_at, created_at
            "#,
        )
        .bind(&token_hash)
        .bind(username)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(IssuedRefreshToken { value, record })
    }

    /// Find a refresh token by its raw value (hashed for lookup)
    pub async fn find_by_value(
        &self,
        value: &str,
    ) -> Result<Option<RefreshToken>, RefreshTokenRepositoryError> {
        let token_hash = Self::hash_value(value);

        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT id, token_hash, username, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Verify that a token has not expired.
    ///
    /// An expired record is deleted as a side effect of the check (lazy
    /// cleanup), then `Expired` is returned.
    pub async fn verify_not_expired(
        &self,
        token: RefreshToken,
    ) -> Result<RefreshToken, RefreshTokenRepositoryError> {
        if token.expires_at < Utc::now() {
            sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
                .bind(token.id)
                .execute(&self.pool)
                .await?;
            return Err(RefreshTokenRepositoryError::Expired);
        }

        Ok(token)
    }

    /// Delete a refresh token by its raw value. Idempotent: no error if
    /// the value is unknown.
    pub async fn delete_by_value(
        &self,
        value: &str,
    ) -> Result<bool, RefreshTokenRepositoryError> {
        let token_hash = Self::hash_value(value);

        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(&token_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete all refresh tokens for a user (bulk revoke)
    pub async fn delete_by_username(
        &self,
        username: &str,
    ) -> Result<u64, RefreshTokenRepositoryError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove all expired records. Lazy cleanup only fires on lookup, so an
    /// external sweep can call this periodically.
    pub async fn cleanup_expired(&self) -> Result<u64, RefreshTokenRepositoryError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Count live tokens for a user
    pub async fn count_for_user(
        &self,
        username: &str,
    ) -> Result<i64, RefreshTokenRepositoryError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM refresh_tokens
            WHERE username = $1 AND expires_at > NOW()
            "#,
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    #[cfg(test)]
    async fn insert_with_expiry(
        &self,
        username: &str,
        expires_at: chrono::DateTime<Utc>,
    ) -> Result<IssuedRefreshToken, RefreshTokenRepositoryError> {
        let value = Self::generate_value();
        let token_hash = Self::hash_value(&value);

        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token_hash, username, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, token_hash, username, expires_at, created_at
            "#,
        )
        .bind(&token_hash)
        .bind(username)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(IssuedRefreshToken { value, record })
    }
}
