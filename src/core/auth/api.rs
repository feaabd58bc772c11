//! Auth API endpoints
//!
//! Provides REST API endpoints for authentication:
//! - POST /auth/signup - Register a new user
//! - POST /auth/login - Login, access token in body + refresh cookie
//! - POST /auth/refresh - Mint a new access token from the refresh cookie
//! - POST /auth/logout - Revoke the refresh token and clear the cookie
//!
//! The access token travels in the response body where client code can use
//! it; the refresh token travels only in an HttpOnly cookie scoped to
//! /auth, out of reach of scripts.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::core::auth::service::{AuthError, LoginRequest, SignupRequest};
use crate::core::state::AppState;

/// Name of the refresh token cookie
pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Path the refresh cookie is scoped to
const REFRESH_COOKIE_PATH: &str = "/auth";

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Convert AuthError to API response
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            AuthError::UsernameTaken => (StatusCode::CONFLICT, "USERNAME_TAKEN"),
            AuthError::EmailTaken => (StatusCode::CONFLICT, "EMAIL_TAKEN"),
            AuthError::MissingRefreshToken => (StatusCode::UNAUTHORIZED, "MISSING_REFRESH_TOKEN"),
            AuthError::RefreshTokenNotFound => (StatusCode::FORBIDDEN, "REFRESH_TOKEN_NOT_FOUND"),
            AuthError::RefreshTokenExpired => (StatusCode::FORBIDDEN, "REFRESH_TOKEN_EXPIRED"),
            AuthError::UnknownUser => (StatusCode::NOT_FOUND, "UNKNOWN_USER"),
            AuthError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            AuthError::Unauthenticated => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            AuthError::Forbidden => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ApiError::new(self.to_string(), code);

        (status, Json(body)).into_response()
    }
}

/// Response body for auth operations: a message plus the access token when
/// one was issued
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: Option<String>,
}

impl AuthResponse {
    fn new(message: impl Into<String>, token: Option<String>) -> Self {
        Self {
            message: message.into(),
            token,
        }
    }
}

/// Build the refresh cookie: HttpOnly and Secure, scoped to /auth,
/// SameSite=Strict, expiring with the stored token
fn refresh_cookie(value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, value))
        .http_only(true)
        .secure(true)
        .path(REFRESH_COOKIE_PATH)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

/// Build a clearing cookie (Max-Age=0) instructing the client to drop its
/// refresh token
fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, ""))
        .http_only(true)
        .secure(true)
        .path(REFRESH_COOKIE_PATH)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Create the auth API router
pub fn auth_router(state: AppState) -> Router {
    Router::new()
        .route("/auth/signup", post(signup_handler))
        .route("/auth/login", post(login_handler))
        .route("/auth/refresh", post(refresh_handler))
        .route("/auth/logout", post(logout_handler))
        .with_state(state)
}

/// POST /auth/signup
async fn signup_handler(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Response {
    tracing::info!("signup attempt for username: {}", request.username);

    match state.auth.signup(request).await {
        Ok(user) => (
            StatusCode::OK,
            Json(AuthResponse::new(
                format!("User {} registered successfully", user.username),
                None,
            )),
        )
            .into_response(),
        // Conflicts keep the auth response shape so clients can show the
        // message directly
        Err(e @ (AuthError::UsernameTaken | AuthError::EmailTaken)) => (
            StatusCode::CONFLICT,
            Json(AuthResponse::new(e.to_string(), None)),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /auth/login
async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    tracing::info!("login attempt for username: {}", request.username);

    let outcome = state.auth.login(request).await?;

    let jar = jar.add(refresh_cookie(
        outcome.refresh_token,
        state.refresh_token_max_age_secs,
    ));

    Ok((
        jar,
        Json(AuthResponse::new(
            "Login successful",
            Some(outcome.access_token),
        )),
    ))
}

/// POST /auth/refresh
///
/// Reads the refresh cookie and mints a new access token. An invalid or
/// expired refresh token is fatal for the session: the response carries a
/// clearing cookie, forcing re-login.
async fn refresh_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    let value = jar
        .get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string());

    match state.auth.refresh(value.as_deref()).await {
        Ok(token) => Json(AuthResponse::new("Token refreshed", Some(token))).into_response(),
        Err(e @ (AuthError::RefreshTokenNotFound | AuthError::RefreshTokenExpired)) => {
            tracing::warn!("refresh rejected: {}", e);
            let jar = jar.add(clear_refresh_cookie());
            (jar, e).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// POST /auth/logout
///
/// Revokes the refresh token if one is presented and always clears the
/// cookie.
async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    let value = jar
        .get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string());

    state.auth.logout(value.as_deref()).await?;

    let jar = jar.add(clear_refresh_cookie());

    Ok((
        jar,
        Json(AuthResponse::new("Logged out successfully", None)),
    ))
}
