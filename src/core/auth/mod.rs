//! Authentication module for blogforge
//!
//! This module provides authentication functionality including:
//! - Access token issuance and verification (stateless, signed)
//! - Refresh token lifecycle orchestration (login, refresh, logout)
//! - Per-request identity resolution and guard functions
//! - REST API endpoints for auth operations

pub mod api;
pub mod extract;
pub mod jwt;
pub mod service;

pub use api::{ApiError, AuthResponse, REFRESH_COOKIE_NAME, auth_router};
pub use extract::{AuthContext, CurrentUser, MaybeUser, has_role, is_owner};
pub use jwt::{Claims, JwtService, TokenError};
pub use service::{AuthError, AuthService, LoginOutcome, LoginRequest, SignupRequest};
