//! Blog API endpoints
//!
//! Reading is public; writing requires an authenticated identity, checked
//! with explicit guard calls in the handlers. Updating or deleting a post
//! additionally requires ownership or the admin role.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::core::auth::api::ApiError;
use crate::core::auth::extract::{CurrentUser, has_role, is_owner};
use crate::core::auth::service::AuthError;
use crate::core::db::models::{Blog, CreateBlog, Role, UpdateBlog};
use crate::core::db::repositories::BlogRepositoryError;
use crate::core::state::AppState;

/// Default page size for listings
const DEFAULT_PAGE_SIZE: i64 = 50;

/// Hard cap on page size
const MAX_PAGE_SIZE: i64 = 100;

/// Blog API error types
#[derive(Debug, thiserror::Error)]
pub enum BlogApiError {
    #[error("Blog not found")]
    NotFound,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BlogRepositoryError> for BlogApiError {
    fn from(err: BlogRepositoryError) -> Self {
        match err {
            BlogRepositoryError::NotFound => BlogApiError::NotFound,
            BlogRepositoryError::DatabaseError(e) => BlogApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for BlogApiError {
    fn into_response(self) -> Response {
        match self {
            BlogApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(ApiError::new("Blog not found", "BLOG_NOT_FOUND")),
            )
                .into_response(),
            BlogApiError::Auth(e) => e.into_response(),
            BlogApiError::Internal(e) => (
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
    pub topic: Option<String>,
}

impl ListParams {
    fn page(&self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Create the blog API router
pub fn blogs_router(state: AppState) -> Router {
    Router::new()
        .route("/api/blogs", get(list_blogs_handler).post(create_blog_handler))
        .route(
            "/api/blogs/{id}",
            get(get_blog_handler)
                .put(update_blog_handler)
                .delete(delete_blog_handler),
        )
        .with_state(state)
}

/// GET /api/blogs
async fn list_blogs_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Blog>>, BlogApiError> {
    let (limit, offset) = params.page();

    let blogs = match &params.topic {
        Some(topic) => state.blogs.list_by_topic(topic, limit, offset).await?,
        None => state.blogs.list(limit, offset).await?,
    };

    Ok(Json(blogs))
}

/// GET /api/blogs/{id}
async fn get_blog_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Blog>, BlogApiError> {
    let blog = state
        .blogs
        .find_by_id(id)
        .await?
        .ok_or(BlogApiError::NotFound)?;

    Ok(Json(blog))
}

/// POST /api/blogs
async fn create_blog_handler(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateBlog>,
) -> Result<(StatusCode, Json<Blog>), BlogApiError> {
    let ctx = user.0;

    if !(has_role(&ctx, Role::User) || has_role(&ctx, Role::Admin)) {
        return Err(AuthError::Forbidden.into());
    }

    let blog = state.blogs.create(&ctx.username, &request).await?;

    tracing::info!("blog created by {}: {}", ctx.username, blog.id);

    Ok((StatusCode::CREATED, Json(blog)))
}

/// PUT /api/blogs/{id}
async fn update_blog_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
    Json(request): Json<UpdateBlog>,
) -> Result<Json<Blog>, BlogApiError> {
    let ctx = user.0;

    let blog = state
        .blogs
        .find_by_id(id)
        .await?
        .ok_or(BlogApiError::NotFound)?;

    if !(is_owner(&ctx, &blog.author_username) || has_role(&ctx, Role::Admin)) {
        return Err(AuthError::Forbidden.into());
    }

    let updated = state.blogs.update(id, &request).await?;

    Ok(Json(updated))
}

/// DELETE /api/blogs/{id}
async fn delete_blog_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> Result<StatusCode, BlogApiError> {
    let ctx = user.0;

    let blog = state
        .blogs
        .find_by_id(id)
        .await?
        .ok_or(BlogApiError::NotFound)?;

    if !(is_owner(&ctx, &blog.author_username) || has_role(&ctx, Role::Admin)) {
        return Err(AuthError::Forbidden.into());
    }

    state.blogs.delete(id).await?;

    tracing::info!("blog deleted by {}: {}", ctx.username, id);

    Ok(StatusCode::NO_CONTENT)
}
