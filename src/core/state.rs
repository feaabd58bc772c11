//! Shared application state
//!
//! All components are constructed once at startup and injected here
//! explicitly; routers and extractors receive their collaborators through
//! this state rather than ambient globals.

use crate::core::auth::jwt::JwtService;
use crate::core::auth::service::AuthService;
use crate::core::db::repositories::{BlogRepository, UserRepository};
use crate::core::users::service::UserService;

/// Application state shared by every router
#[derive(Clone)]
pub struct AppState {
    /// Credential store, also consulted by the request identity filter
    pub users: UserRepository,
    /// Blog persistence
    pub blogs: BlogRepository,
    /// Login/refresh/logout orchestration
    pub auth: AuthService,
    /// Profile and photo handling
    pub user_service: UserService,
    /// Access token issuance and verification
    pub jwt: JwtService,
    /// Max-Age for the refresh cookie, in seconds
    pub refresh_token_max_age_secs: i64,
}
