//! Request identity resolution
//!
//! Runs once per request, before any authorization decision: extract the
//! bearer access token, verify it, and resolve the full identity (roles
//! included) from the credential store. A bad or absent token never fails
//! the request here; handlers that require an identity extract
//! [`CurrentUser`], everything else can take [`MaybeUser`] and decide.
//!
//! The token carries only a username, so roles are freshly looked up on
//! every request; a role change takes effect without waiting out old tokens.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use std::convert::Infallible;

use crate::core::auth::service::AuthError;
use crate::core::db::models::Role;
use crate::core::state::AppState;

/// Request-scoped identity established by the authentication filter
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub username: String,
    pub roles: Vec<Role>,
}

/// Check whether the identity holds a role
pub fn has_role(ctx: &AuthContext, role: Role) -> bool {
    ctx.roles.contains(&role)
}

/// Check whether the identity owns the resource identified by `owner_username`
pub fn is_owner(ctx: &AuthContext, owner_username: &str) -> bool {
    ctx.username.eq_ignore_ascii_case(owner_username)
}

/// Extract the bearer token from the Authorization header, if any
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() { None } else { Some(token) }
}

/// Optional identity: never rejects, resolves to `None` when no valid
/// credential is presented
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<AuthContext>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // An identity installed earlier in the request is never overwritten
        if let Some(ctx) = parts.extensions.get::<AuthContext>() {
            return Ok(MaybeUser(Some(ctx.clone())));
        }

        let Some(token) = bearer_token(&parts.headers) else {
            tracing::trace!("no bearer token in Authorization header");
            return Ok(MaybeUser(None));
        };

        // Malformed, tampered, and expired tokens are all swallowed into the
        // unauthenticated state; downstream authorization decides the outcome
        let claims = match state.jwt.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!("rejected access token: {}", e);
                return Ok(MaybeUser(None));
            }
        };

        let user = match state.users.find_by_username(&claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("access token subject no longer exists: {}", claims.sub);
                return Ok(MaybeUser(None));
            }
            Err(e) => {
                tracing::error!("identity lookup failed for {}: {}", claims.sub, e);
                return Ok(MaybeUser(None));
            }
        };

        let ctx = AuthContext {
            username: user.username,
            roles: user.roles,
        };

        parts.extensions.insert(ctx.clone());
        tracing::debug!("request authenticated as {}", ctx.username);

        Ok(MaybeUser(Some(ctx)))
    }
}

/// Required identity: rejects with 401 when no valid credential is presented
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthContext);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeUser(ctx) = MaybeUser::from_request_parts(parts, state)
            .await
            .unwrap_or(MaybeUser(None));

        ctx.map(CurrentUser).ok_or(AuthError::Unauthenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn ctx(username: &str, roles: Vec<Role>) -> AuthContext {
        AuthContext {
            username: username.to_string(),
            roles,
        }
    }

    // ========================================================================
    // Bearer Token Extraction Tests
    // ========================================================================

    #[test]
    fn test_bearer_token_valid() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer my_token_123"),
        );

        assert_eq!(bearer_token(&headers), Some("my_token_123"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );

        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_empty_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));

        assert_eq!(bearer_token(&headers), None);
    }

    // ========================================================================
    // Guard Function Tests
    // ========================================================================

    #[test]
    fn test_has_role() {
        let user = ctx("alice", vec![Role::User]);
        let admin = ctx("root", vec![Role::User, Role::Admin]);

        assert!(has_role(&user, Role::User));
        assert!(!has_role(&user, Role::Admin));
        assert!(has_role(&admin, Role::Admin));
    }

    #[test]
    fn test_has_role_empty_roles() {
        let nobody = ctx("ghost", vec![]);

        assert!(!has_role(&nobody, Role::User));
        assert!(!has_role(&nobody, Role::Admin));
    }

    #[test]
    fn test_is_owner() {
        let user = ctx("alice", vec![Role::User]);

        assert!(is_owner(&user, "alice"));
        assert!(is_owner(&user, "Alice"));
        assert!(!is_owner(&user, "bob"));
    }
}
