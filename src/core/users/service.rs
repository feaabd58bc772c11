//! User profile business logic
//!
//! Listing, lookup, deletion, and profile photo management. Photo bytes
//! live in the external object storage; this service only tracks the URL
//! and public id on the user row.

use std::sync::Arc;

use uuid::Uuid;

use crate::core::db::models::UserResponse;
use crate::core::db::repositories::{
    RefreshTokenRepository, RefreshTokenRepositoryError, UserRepository, UserRepositoryError,
};
use crate::core::storage::{ObjectStorage, StorageError, StoredObject};

/// User service error types
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User not found")]
    NotFound,

    #[error("Image upload failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserRepositoryError> for UserServiceError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::NotFound => UserServiceError::NotFound,
            _ => UserServiceError::Internal(err.to_string()),
        }
    }
}

impl From<RefreshTokenRepositoryError> for UserServiceError {
    fn from(err: RefreshTokenRepositoryError) -> Self {
        UserServiceError::Internal(err.to_string())
    }
}

/// User service
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    refresh_tokens: RefreshTokenRepository,
    storage: Arc<dyn ObjectStorage>,
}

impl UserService {
    /// Create a new user service
    pub fn new(
        users: UserRepository,
        refresh_tokens: RefreshTokenRepository,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            storage,
        }
    }

    /// List users with pagination
    pub async fn list_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UserResponse>, UserServiceError> {
        let users = self.users.list(limit, offset).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    /// Fetch a user by username
    pub async fn get_by_username(&self, username: &str) -> Result<UserResponse, UserServiceError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        Ok(user.into())
    }

    /// Delete a user.
    ///
    /// Removes the profile photo from object storage (best effort), deletes
    /// the row, then revokes all of the user's refresh tokens so no live
    /// session survives the account.
    pub async fn delete_user(&self, id: Uuid) -> Result<(), UserServiceError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        if let Some(public_id) = &user.profile_photo_public_id
            && let Err(e) = self.storage.delete(public_id).await
        {
            tracing::warn!(
                "failed to delete profile photo {} for {}: {}",
                public_id,
                user.username,
                e
            );
        }

        self.users.delete(id).await?;

        let revoked = self.refresh_tokens.delete_by_username(&user.username).await?;
        tracing::info!(
            "user deleted: {} ({} refresh tokens revoked)",
            user.username,
            revoked
        );

        Ok(())
    }

    /// Replace a user's profile photo.
    ///
    /// The old image is deleted from storage first (best effort) and its
    /// pointers cleared, then the new one is uploaded and recorded.
    pub async fn update_profile_photo(
        &self,
        username: &str,
        data: Vec<u8>,
        filename: &str,
    ) -> Result<StoredObject, UserServiceError> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(UserServiceError::NotFound)?;

        if let Some(old_public_id) = &user.profile_photo_public_id {
            if let Err(e) = self.storage.delete(old_public_id).await {
                tracing::warn!(
                    "failed to delete old profile photo {} for {}: {}",
                    old_public_id,
                    username,
                    e
                );
            }
            self.users.update_profile_photo(username, None, None).await?;
        }

        let stored = self
            .storage
            .upload(data, filename, "profile_photos")
            .await?;

        self.users
            .update_profile_photo(username, Some(&stored.url), Some(&stored.public_id))
            .await?;

        tracing::info!("profile photo updated for {}", username);

        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_service_error_display() {
        assert_eq!(format!("{}", UserServiceError::NotFound), "User not found");

        let err = UserServiceError::Storage(StorageError::BadResponse("public_id"));
        assert!(format!("{}", err).contains("public_id"));
    }

    #[test]
    fn test_user_service_error_from_repository_error() {
        let err: UserServiceError = UserRepositoryError::NotFound.into();
        assert!(matches!(err, UserServiceError::NotFound));

        let err: UserServiceError = UserRepositoryError::UsernameTaken.into();
        assert!(matches!(err, UserServiceError::Internal(_)));
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_photo_replacement_round_trip() {
        use crate::core::storage::InMemoryStorage;

        let (pool, username) = setup_test_user().await;
        let storage = Arc::new(InMemoryStorage::default());
        let service = UserService::new(
            UserRepository::new(pool.clone()),
            RefreshTokenRepository::new(pool.clone()),
            storage.clone(),
        );

        let first = service
            .update_profile_photo(&username, vec![1, 2, 3], "one.png")
            .await
            .unwrap();
        assert!(storage.contains(&first.public_id));

        let second = service
            .update_profile_photo(&username, vec![4, 5, 6], "two.png")
            .await
            .unwrap();

        // Old photo is gone, new one recorded
        assert!(!storage.contains(&first.public_id));
        assert!(storage.contains(&second.public_id));

        let user = service.get_by_username(&username).await.unwrap();
        assert_eq!(user.profile_photo_url.as_deref(), Some(second.url.as_str()));

        cleanup_test_user(&pool, &username).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_delete_user_revokes_refresh_tokens() {
        use crate::core::storage::InMemoryStorage;

        let (pool, username) = setup_test_user().await;
        let users = UserRepository::new(pool.clone());
        let refresh_tokens = RefreshTokenRepository::new(pool.clone());
        let service = UserService::new(
            users.clone(),
            refresh_tokens.clone(),
            Arc::new(InMemoryStorage::default()),
        );

        refresh_tokens.create(&username, None).await.unwrap();
        refresh_tokens.create(&username, None).await.unwrap();

        let user = users.find_by_username(&username).await.unwrap().unwrap();
        service.delete_user(user.id).await.unwrap();

        assert!(users.find_by_username(&username).await.unwrap().is_none());
        assert_eq!(refresh_tokens.count_for_user(&username).await.unwrap(), 0);
    }

    // Helper functions for integration tests
    async fn setup_test_user() -> (sqlx::PgPool, String) {
        use crate::core::db::pool::{DbConfig, create_pool};

        let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
        let pool = create_pool(&config)
            .await
            .expect("Failed to create test pool");

        let suffix = &Uuid::new_v4().to_string()[..8];
        let username = format!("user_svc_test_{}", suffix);
        let email = format!("user_svc_test_{}@example.com", suffix);

        sqlx::query(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, 'test_hash')
            "#,
        )
        .bind(&username)
        .bind(&email)
        .execute(&pool)
        .await
        .expect("Failed to create test user");

        (pool, username)
    }

    async fn cleanup_test_user(pool: &sqlx::PgPool, username: &str) {
        sqlx::query("DELETE FROM refresh_tokens WHERE username = $1")
            .bind(username)
            .execute(pool)
            .await
            .expect("Failed to cleanup refresh tokens");
        sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(pool)
            .await
            .expect("Failed to cleanup test user");
    }
}
