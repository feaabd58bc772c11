//! Database repositories for blogforge
//!
//! This module provides repository implementations for database operations.
//! Repositories encapsulate data access logic and provide a clean API for
//! business logic to interact with the database.

pub mod blog;
pub mod refresh_token;
pub mod user;

pub use blog::{BlogRepository, BlogRepositoryError};
pub use refresh_token::{IssuedRefreshToken, RefreshTokenRepository, RefreshTokenRepositoryError};
pub use user::{UserRepository, UserRepositoryError};
