//! Blog repository for database operations

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{Blog, CreateBlog, UpdateBlog};

/// Blog repository error types
#[derive(Debug, thiserror::Error)]
pub enum BlogRepositoryError {
    #[error("Blog not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Blog repository for database operations
#[derive(Clone)]
pub struct BlogRepository {
    pool: PgPool,
}

impl BlogRepository {
    /// Create a new blog repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a blog post for the given author
    pub async fn create(
        &self,
        author_username: &str,
        blog: &CreateBlog,
    ) -> Result<Blog, BlogRepositoryError> {
        let created = sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (author_username, topic, title, subtitle, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, author_username, topic, title, subtitle, content, created_at
            "#,
        )
        .bind(author_username)
        .bind(&blog.topic)
        .bind(&blog.title)
        .bind(&blog.subtitle)
        .bind(&blog.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Find a blog post by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>, BlogRepositoryError> {
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, author_username, topic, title, subtitle, content, created_at
            FROM blogs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(blog)
    }

    /// List blog posts, newest first, with pagination
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Blog>, BlogRepositoryError> {
        let blogs = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, author_username, topic, title, subtitle, content, created_at
            FROM blogs
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(blogs)
    }

    /// List blog posts for a topic, newest first
    pub async fn list_by_topic(
        &self,
        topic: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Blog>, BlogRepositoryError> {
        let blogs = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, author_username, topic, title, subtitle, content, created_at
            FROM blogs
            WHERE topic = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(topic)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(blogs)
    }

    /// List blog posts by an author, newest first
    pub async fn list_by_author(
        &self,
        author_username: &str,
    ) -> Result<Vec<Blog>, BlogRepositoryError> {
        let blogs = sqlx::query_as::<_, Blog>(
            r#"
            SELECT id, author_username, topic, title, subtitle, content, created_at
            FROM blogs
            WHERE author_username = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(author_username)
        .fetch_all(&self.pool)
        .await?;

        Ok(blogs)
    }

    /// Update a blog post (fields left `None` are unchanged)
    pub async fn update(
        &self,
        id: Uuid,
        updates: &UpdateBlog,
    ) -> Result<Blog, BlogRepositoryError> {
        let blog = sqlx::query_as::<_, Blog>(
            r#"
            UPDATE blogs
            SET
                topic = COALESCE($2, topic),
                title = COALESCE($3, title),
                subtitle = COALESCE($4, subtitle),
                content = COALESCE($5, content)
            WHERE id = $1
            RETURNING id, author_username, topic, title, subtitle, content, created_at
            "#,
        )
        .bind(id)
        .bind(&updates.topic)
        .bind(&updates.title)
        .bind(&updates.subtitle)
        .bind(&updates.content)
        .fetch_optional(&self.pool)
        .await?;

        blog.ok_or(BlogRepositoryError::NotFound)
    }

    /// Delete a blog post by ID
    pub async fn delete(&self, id: Uuid) -> Result<bool, BlogRepositoryError> {
        let result = sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
