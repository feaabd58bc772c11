//! Core domain modules for the blogforge backend

pub mod auth;
pub mod blogs;
pub mod config;
pub mod db;
pub mod state;
pub mod storage;
pub mod users;

pub use config::{Config, ConfigError};
pub use state::AppState;
