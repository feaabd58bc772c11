//! Authentication service
//!
//! Orchestrates signup, login, token refresh, and logout. Coordinates
//! between the user repository, the refresh token repository, and the
//! access token service; collaborators are injected at construction.

use chrono::{DateTime, Utc};

use crate::core::auth::jwt::{JwtService, TokenError};
use crate::core::db::models::UserResponse;
use crate::core::db::repositories::{
    RefreshTokenRepository, RefreshTokenRepositoryError, UserRepository, UserRepositoryError,
};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Refresh token is missing")]
    MissingRefreshToken,

    #[error("Refresh token not found. Please sign in again")]
    RefreshTokenNotFound,

    #[error("Refresh token has expired. Please sign in again")]
    RefreshTokenExpired,

    #[error("User not found")]
    UnknownUser,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::NotFound => AuthError::UnknownUser,
            UserRepositoryError::UsernameTaken => AuthError::UsernameTaken,
            UserRepositoryError::EmailTaken => AuthError::EmailTaken,
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<RefreshTokenRepositoryError> for AuthError {
    fn from(err: RefreshTokenRepositoryError) -> Self {
        match err {
            RefreshTokenRepositoryError::UnknownUser => AuthError::UnknownUser,
            RefreshTokenRepositoryError::Expired => AuthError::RefreshTokenExpired,
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Encoding(e) => AuthError::Internal(e),
            _ => AuthError::Unauthenticated,
        }
    }
}

/// Signup request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    pub email: String,
}

/// Login request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Outcome of a successful login: the access token for the response body,
/// and the refresh token value plus its expiry for cookie construction.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    refresh_tokens: RefreshTokenRepository,
    jwt: JwtService,
    refresh_ttl_days: i64,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        users: UserRepository,
        refresh_tokens: RefreshTokenRepository,
        jwt: JwtService,
        refresh_ttl_days: i64,
    ) -> Self {
        Self {
            users,
            refresh_tokens,
            jwt,
            refresh_ttl_days,
        }
    }

    /// Validate signup fields.
    ///
    /// Uniqueness is the repository's concern; this only rejects blank
    /// fields and structurally hopeless email addresses.
    fn validate_signup(request: &SignupRequest) -> Result<(), AuthError> {
        if request.username.trim().is_empty() {
            return Err(AuthError::InvalidRequest(
                "username must not be blank".to_string(),
            ));
        }

        if request.password.is_empty() {
            return Err(AuthError::InvalidRequest(
                "password must not be blank".to_string(),
            ));
        }

        let email = request.email.trim();
        let valid_email = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
            None => false,
        };
        if !valid_email {
            return Err(AuthError::InvalidRequest(
                "email address is not valid".to_string(),
            ));
        }

        Ok(())
    }

    /// Register a new user.
    ///
    /// Conflicts on username or email are detected before the insert and
    /// surface as distinct errors.
    pub async fn signup(&self, request: SignupRequest) -> Result<UserResponse, AuthError> {
        Self::validate_signup(&request)?;

        let user = self
            .users
            .create(&request.username, &request.email, &request.password)
            .await?;

        tracing::info!("user registered: {}", user.username);

        Ok(user.into())
    }

    /// Log a user in.
    ///
    /// Verifies credentials, issues an access token, and creates a refresh
    /// token. Unknown username and wrong password both map to
    /// `InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let user = self
            .users
            .authenticate(&request.username, &request.password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let (access_token, _) = self.jwt.issue(&user.username)?;

        let issued = self
            .refresh_tokens
            .create(&user.username, Some(self.refresh_ttl_days))
            .await?;

        tracing::info!("user logged in: {}", user.username);

        Ok(LoginOutcome {
            access_token,
            refresh_token: issued.value,
            refresh_expires_at: issued.record.expires_at,
        })
    }

    /// Mint a new access token from a refresh token value.
    ///
    /// The refresh token itself is not rotated; it stays valid until its
    /// natural expiry or logout. Expiry detection deletes the stored record,
    /// so the caller must clear the client's cookie on that path.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<String, AuthError> {
        let value = refresh_token.ok_or(AuthError::MissingRefreshToken)?;

        let record = self
            .refresh_tokens
            .find_by_value(value)
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        let record = self.refresh_tokens.verify_not_expired(record).await?;

        let (access_token, _) = self.jwt.issue(&record.username)?;

        tracing::debug!("access token refreshed for {}", record.username);

        Ok(access_token)
    }

    /// Revoke a refresh token.
    ///
    /// A missing value is a no-op; logout always succeeds.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<(), AuthError> {
        if let Some(value) = refresh_token {
            let deleted = self.refresh_tokens.delete_by_value(value).await?;
            if deleted {
                tracing::info!("refresh token revoked");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup_request(username: &str, password: &str, email: &str) -> SignupRequest {
        SignupRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: email.to_string(),
        }
    }

    // ========================================================================
    // Validation Tests
    // ========================================================================

    #[test]
    fn test_validate_signup_accepts_ordinary_requests() {
        assert!(AuthService::validate_signup(&signup_request("alice", "p@ss1", "a@x.com")).is_ok());
        assert!(
            AuthService::validate_signup(&signup_request(
                "bob_42",
                "hunter2",
                "bob@example.co.uk"
            ))
            .is_ok()
        );
    }

    #[test]
    fn test_validate_signup_rejects_blank_username() {
        let result = AuthService::validate_signup(&signup_request("", "p@ss1", "a@x.com"));
        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));

        let result = AuthService::validate_signup(&signup_request("   ", "p@ss1", "a@x.com"));
        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));
    }

    #[test]
    fn test_validate_signup_rejects_blank_password() {
        let result = AuthService::validate_signup(&signup_request("alice", "", "a@x.com"));
        assert!(matches!(result, Err(AuthError::InvalidRequest(_))));
    }

    #[test]
    fn test_validate_signup_rejects_bad_email() {
        for email in ["", "no-at-sign", "@x.com", "a@"] {
            let result = AuthService::validate_signup(&signup_request("alice", "p@ss1", email));
            assert!(
                matches!(result, Err(AuthError::InvalidRequest(_))),
                "email {:?} should be rejected",
                email
            );
        }
    }

    // ========================================================================
    // Error Conversion Tests
    // ========================================================================

    #[test]
    fn test_auth_error_from_user_repository_error() {
        let err: AuthError = UserRepositoryError::UsernameTaken.into();
        assert!(matches!(err, AuthError::UsernameTaken));

        let err: AuthError = UserRepositoryError::EmailTaken.into();
        assert!(matches!(err, AuthError::EmailTaken));

        let err: AuthError = UserRepositoryError::NotFound.into();
        assert!(matches!(err, AuthError::UnknownUser));

        let err: AuthError = UserRepositoryError::HashingError("boom".to_string()).into();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn test_auth_error_from_refresh_token_repository_error() {
        let err: AuthError = RefreshTokenRepositoryError::UnknownUser.into();
        assert!(matches!(err, AuthError::UnknownUser));

        let err: AuthError = RefreshTokenRepositoryError::Expired.into();
        assert!(matches!(err, AuthError::RefreshTokenExpired));
    }

    #[test]
    fn test_auth_error_from_token_error() {
        let err: AuthError = TokenError::Encoding("bad key".to_string()).into();
        assert!(matches!(err, AuthError::Internal(_)));

        let err: AuthError = TokenError::Expired.into();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[test]
    fn test_auth_error_display() {
        assert_eq!(
            format!("{}", AuthError::InvalidCredentials),
            "Invalid username or password"
        );
        assert_eq!(
            format!("{}", AuthError::UsernameTaken),
            "Username already taken"
        );
        assert_eq!(
            format!("{}", AuthError::MissingRefreshToken),
            "Refresh token is missing"
        );
        assert_eq!(
            format!("{}", AuthError::RefreshTokenExpired),
            "Refresh token has expired. Please sign in again"
        );
    }

    // ========================================================================
    // Request Deserialization Tests
    // ========================================================================

    #[test]
    fn test_signup_request_deserialization() {
        let json = r#"{
            "username": "alice",
            "password": "p@ss1",
            "email": "a@x.com"
        }"#;

        let request: SignupRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "alice");
        assert_eq!(request.password, "p@ss1");
        assert_eq!(request.email, "a@x.com");
    }

    #[test]
    fn test_login_request_deserialization() {
        let json = r#"{ "username": "alice", "password": "p@ss1" }"#;

        let request: LoginRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.username, "alice");
        assert_eq!(request.password, "p@ss1");
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_signup_then_login() {
        let (service, username, pool) = setup_service().await;

        let outcome = service
            .login(LoginRequest {
                username: username.clone(),
                password: "p@ss1".to_string(),
            })
            .await
            .unwrap();

        assert!(!outcome.access_token.is_empty());
        assert!(!outcome.refresh_token.is_empty());
        assert!(outcome.refresh_expires_at > Utc::now());

        // The issued access token verifies and names the logged-in user
        let jwt = JwtService::new("auth_service_test_secret", 15);
        let claims = jwt.verify(&outcome.access_token).unwrap();
        assert_eq!(claims.sub, username);

        cleanup(&pool, &username).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_login_wrong_password() {
        let (service, username, pool) = setup_service().await;

        let result = service
            .login(LoginRequest {
                username: username.clone(),
                password: "wrong".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        cleanup(&pool, &username).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_login_unknown_user_same_error_shape() {
        let (service, username, pool) = setup_service().await;

        let result = service
            .login(LoginRequest {
                username: "no_such_user_anywhere".to_string(),
                password: "p@ss1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));

        cleanup(&pool, &username).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_refresh_mints_new_access_token() {
        let (service, username, pool) = setup_service().await;

        let outcome = service
            .login(LoginRequest {
                username: username.clone(),
                password: "p@ss1".to_string(),
            })
            .await
            .unwrap();

        let token = service.refresh(Some(&outcome.refresh_token)).await.unwrap();
        assert!(!token.is_empty());

        // No rotation: the same refresh token keeps working
        let token2 = service.refresh(Some(&outcome.refresh_token)).await.unwrap();
        assert!(!token2.is_empty());

        cleanup(&pool, &username).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_refresh_missing_token() {
        let (service, username, pool) = setup_service().await;

        let result = service.refresh(None).await;
        assert!(matches!(result, Err(AuthError::MissingRefreshToken)));

        cleanup(&pool, &username).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_logout_then_refresh_fails_not_found() {
        let (service, username, pool) = setup_service().await;

        let outcome = service
            .login(LoginRequest {
                username: username.clone(),
                password: "p@ss1".to_string(),
            })
            .await
            .unwrap();

        service.logout(Some(&outcome.refresh_token)).await.unwrap();

        let result = service.refresh(Some(&outcome.refresh_token)).await;
        assert!(matches!(result, Err(AuthError::RefreshTokenNotFound)));

        cleanup(&pool, &username).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_logout_without_token_succeeds() {
        let (service, username, pool) = setup_service().await;

        assert!(service.logout(None).await.is_ok());

        cleanup(&pool, &username).await;
    }

    // Helper functions for integration tests
    async fn setup_service() -> (AuthService, String, sqlx::PgPool) {
        use crate::core::db::pool::{DbConfig, create_pool};

        let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
        let pool = create_pool(&config)
            .await
            .expect("Failed to create test pool");

        let users = UserRepository::new(pool.clone());
        let refresh_tokens = RefreshTokenRepository::new(pool.clone());
        let jwt = JwtService::new("auth_service_test_secret", 15);
        let service = AuthService::new(users, refresh_tokens, jwt, 7);

        let suffix = &uuid::Uuid::new_v4().to_string()[..8];
        let username = format!("auth_test_{}", suffix);
        let email = format!("auth_test_{}@example.com", suffix);

        service
            .signup(SignupRequest {
                username: username.clone(),
                password: "p@ss1".to_string(),
                email,
            })
            .await
            .expect("signup failed");

        (service, username, pool)
    }

    async fn cleanup(pool: &sqlx::PgPool, username: &str) {
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
