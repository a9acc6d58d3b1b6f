/// Token claims structure
///
/// Payload of both access and refresh tokens: the subject identifier,
/// issued-at, expiry, and a random token id. The token kind is not
/// recorded in the payload; kinds differ only in lifetime, so the kind
/// of a presented token cannot be recovered from the token alone.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AuthError};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject identifier (user id as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp, exclusive: now >= exp is expired)
    pub exp: i64,
    /// Random token id; makes two tokens minted for the same subject in
    /// the same second distinct values
    pub jti: String,
}

impl Claims {
    pub fn new(subject: Uuid, lifetime_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: subject.to_string(),
            iat: now,
            exp: now + lifetime_seconds,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Extract the subject identifier from the claims.
    pub fn subject_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| {
            tracing::warn!("Token subject is not a valid UUID");
            AppError::Auth(AuthError::InvalidCredential)
        })
    }

    /// Whether the token is expired. Expiry is exclusive: a token is
    /// invalid from the exact expiry instant onward.
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.exp
    }
}
