/// Session management: issuance, authentication, and rotation.
///
/// `SessionManager` ties the credential codec to a revocation ledger.
/// Issuance and authentication never touch the ledger; only rotation
/// does, because only refresh tokens are individually revocable.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{AppError, AuthError, DatabaseError};
use crate::session::codec::{TokenCodec, TokenKind};
use crate::session::ledger::{LedgerError, RevocationLedger};

/// A freshly minted access/refresh pair
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionManager {
    codec: TokenCodec,
    ledger: Arc<dyn RevocationLedger>,
}

impl SessionManager {
    pub fn new(codec: TokenCodec, ledger: Arc<dyn RevocationLedger>) -> Self {
        Self { codec, ledger }
    }

    /// Mint a fresh access/refresh pair for the subject.
    ///
    /// Called after external credential checks succeed (signup, signin)
    /// and at the end of a successful rotation.
    pub fn issue(&self, subject: Uuid) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.codec.mint(subject, TokenKind::Access)?,
            refresh_token: self.codec.mint(subject, TokenKind::Refresh)?,
        })
    }

    /// Verify a presented access credential and resolve it to a subject.
    ///
    /// An absent credential and an invalid one produce the same error
    /// kind; only the logged reason differs. The ledger is never
    /// consulted: access tokens are not individually revocable.
    pub fn authenticate(&self, presented: Option<&str>) -> Result<Uuid, AppError> {
        match presented {
            Some(token) if !token.is_empty() => self.codec.parse(token)?.subject_id(),
            _ => {
                tracing::warn!("Authentication failed: no credential presented");
                Err(AppError::Auth(AuthError::MissingCredential))
            }
        }
    }

    /// Exchange a refresh token for a new pair, invalidating it.
    ///
    /// The presented token is recorded as spent before the replacement
    /// pair is minted, so a crash in between leaves the old token burned
    /// rather than still valid. Concurrent rotations of the same token
    /// race on the ledger's uniqueness constraint; exactly one wins.
    pub async fn rotate(&self, presented: &str) -> Result<TokenPair, AppError> {
        // Signature and expiry checks; unparseable input never reaches
        // the ledger.
        let claims = self.codec.parse(presented)?;
        let subject = claims.subject_id()?;

        match self.ledger.is_spent(presented).await {
            Ok(false) => {}
            Ok(true) => {
                tracing::warn!(subject = %subject, "Refresh token reuse rejected");
                return Err(AppError::Auth(AuthError::InvalidCredential));
            }
            Err(e) => return Err(storage_error(e)),
        }

        match self.ledger.record_spent(presented, claims.exp).await {
            Ok(()) => {}
            Err(LedgerError::DuplicateRecord) => {
                // Lost a concurrent rotation of the same token.
                tracing::warn!(subject = %subject, "Concurrent refresh token rotation rejected");
                return Err(AppError::Auth(AuthError::InvalidCredential));
            }
            Err(e) => return Err(storage_error(e)),
        }

        // Best-effort cleanup; failure does not affect the rotation.
        match self.ledger.prune_expired(chrono::Utc::now().timestamp()).await {
            Ok(pruned) if pruned > 0 => {
                tracing::debug!(pruned = pruned, "Pruned expired revocation records");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Failed to prune expired revocation records");
            }
        }

        // The old token is burned at this point. If minting fails the
        // subject has to sign in again; there is no rollback.
        let pair = self.issue(subject)?;

        tracing::info!(subject = %subject, "Refresh token rotated");
        Ok(pair)
    }
}

fn storage_error(err: LedgerError) -> AppError {
    AppError::Database(DatabaseError::UnexpectedError(err.to_string()))
}
