//! Access token issuance and verification
//!
//! Stateless signed tokens using the HS256 algorithm with a process-wide
//! symmetric key. The claim set carries only the subject username plus
//! issued-at and expires-at instants; roles are resolved from the credential
//! store at request time, never embedded in the token.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Access token verification errors.
///
/// The three failure modes are deliberately distinct: a structurally broken
/// token, a token failing the integrity check, and a well-formed token past
/// its expiry must be distinguishable to callers.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Malformed access token")]
    Malformed,

    #[error("Access token signature is invalid")]
    BadSignature,

    #[error("Access token expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    }
}

/// Signed claim set of an access token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Access token service.
///
/// The signing key is derived once at construction and immutable afterwards;
/// concurrent use is read-only.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_minutes: i64,
}

impl JwtService {
    /// Create a new access token service
    pub fn new(secret: &str, expiration_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_minutes,
        }
    }

    /// Issue a signed access token for the given username.
    ///
    /// Returns the token and its expiry as a Unix timestamp.
    pub fn issue(&self, username: &str) -> Result<(String, i64), TokenError> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.expiration_minutes);

        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok((token, exp.timestamp()))
    }

    /// Verify a token and return its claims.
    ///
    /// Fails with `Malformed`, `BadSignature`, or `Expired`. An absent token
    /// is a caller-level state; this function is never handed one.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        // Strict expiration checking
        validation.leeway = 0;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Ok(token_data.claims)
    }
}
