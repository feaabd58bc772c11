//! Blog publishing module

pub mod api;

pub use api::{BlogApiError, blogs_router};
