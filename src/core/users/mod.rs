//! User profile module

pub mod api;
pub mod service;

pub use api::{UserApiError, users_router};
pub use service::{UserService, UserServiceError};
