//! User API endpoints
//!
//! Public profile lookup, admin-only listing, account deletion (self or
//! admin), and profile photo replacement through the object storage
//! collaborator.

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde::Deserialize;

use crate::core::auth::api::ApiError;
use crate::core::auth::extract::{CurrentUser, has_role, is_owner};
use crate::core::auth::service::AuthError;
use crate::core::db::models::{Role, UserResponse};
use crate::core::state::AppState;
use crate::core::storage::StoredObject;
use crate::core::users::service::UserServiceError;

/// Default page size for listings
const DEFAULT_PAGE_SIZE: i64 = 50;

/// Hard cap on page size
const MAX_PAGE_SIZE: i64 = 100;

/// User API error types
#[derive(Debug, thiserror::Error)]
pub enum UserApiError {
    #[error("User not found")]
    NotFound,

    #[error("Invalid request: {0}")]
    BadRequest(&'static str),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UserServiceError> for UserApiError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::NotFound => UserApiError::NotFound,
            UserServiceError::Storage(e) => UserApiError::Internal(e.to_string()),
            UserServiceError::Internal(e) => UserApiError::Internal(e),
        }
    }
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        match self {
            UserApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ApiError::new("User not found", "USER_NOT_FOUND")),
            )
                .into_response(),
            UserApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                Json(ApiError::new(msg, "INVALID_REQUEST")),
            )
                .into_response(),
            UserApiError::Auth(e) => e.into_response(),
            UserApiError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(e, "INTERNAL_ERROR")),
            )
                .into_response(),
        }
    }
}

/// Listing parameters
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Create the user API router
pub fn users_router(state: AppState) -> Router {
    Router::new()
        .route("/api/users", get(list_users_handler))
        .route(
            "/api/users/{username}",
            get(get_user_handler).delete(delete_user_handler),
        )
        .route("/api/users/me/photo", put(update_photo_handler))
        .with_state(state)
}

/// GET /api/users (admin only)
async fn list_users_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<UserResponse>>, UserApiError> {
    if !has_role(&user.0, Role::Admin) {
        return Err(AuthError::Forbidden.into());
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let users = state.user_service.list_users(limit, offset).await?;

    Ok(Json(users))
}

/// GET /api/users/{username}
async fn get_user_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, UserApiError> {
    let user = state.user_service.get_by_username(&username).await?;

    Ok(Json(user))
}

/// DELETE /api/users/{username} (self or admin)
async fn delete_user_handler(
    State(state): State<AppState>,
    Path(username): Path<String>,
    user: CurrentUser,
) -> Result<StatusCode, UserApiError> {
    let ctx = user.0;

    let target = state.user_service.get_by_username(&username).await?;

    if !(is_owner(&ctx, &target.username) || has_role(&ctx, Role::Admin)) {
        return Err(AuthError::Forbidden.into());
    }

    state.user_service.delete_user(target.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users/me/photo (multipart, field "file")
async fn update_photo_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<Json<StoredObject>, UserApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| UserApiError::BadRequest("invalid multipart body"))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .unwrap_or("profile_photo")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|_| UserApiError::BadRequest("could not read file field"))?
            .to_vec();

        if data.is_empty() {
            return Err(UserApiError::BadRequest("file field is empty"));
        }

        let stored = state
            .user_service
            .update_profile_photo(&user.0.username, data, &filename)
            .await?;

        return Ok(Json(stored));
    }

    Err(UserApiError::BadRequest("missing file field"))
}
