/// Revocation ledger: durable record of spent refresh tokens.
///
/// A refresh token value with a record here must never rotate again.
/// Token values are stored as SHA-256 digests, never in plaintext;
/// uniqueness of the digest stands in for uniqueness of the value, and
/// the uniqueness constraint is what makes the check-then-record sequence
/// atomic across concurrent callers.
///
/// Records become dead weight once the token's own embedded expiry has
/// passed, so they are pruned opportunistically; a missed prune cycle is
/// a storage-growth concern, not a correctness hazard.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

/// Ledger operation errors
#[derive(Debug)]
pub enum LedgerError {
    /// The token value is already recorded. Surfaces the lost side of a
    /// concurrent rotation race; callers map this to the generic
    /// unauthenticated condition.
    DuplicateRecord,
    Storage(String),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerError::DuplicateRecord => write!(f, "token value already recorded"),
            LedgerError::Storage(msg) => write!(f, "ledger storage error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Hash a token value before storage.
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[async_trait]
pub trait RevocationLedger: Send + Sync {
    /// Insert a record for the token value, failing with
    /// [`LedgerError::DuplicateRecord`] if one already exists. Exactly one
    /// of any number of concurrent callers succeeds for a given value.
    async fn record_spent(&self, token: &str, expires_at: i64) -> Result<(), LedgerError>;

    /// Existence check by token value.
    async fn is_spent(&self, token: &str) -> Result<bool, LedgerError>;

    /// Delete all records whose expiry is at or before `now` (Unix
    /// timestamp). Returns the number of records removed.
    async fn prune_expired(&self, now: i64) -> Result<u64, LedgerError>;
}

/// Postgres-backed ledger. The `token_hash` primary key provides the
/// uniqueness constraint.
pub struct PgRevocationLedger {
    pool: PgPool,
}

impl PgRevocationLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevocationLedger for PgRevocationLedger {
    async fn record_spent(&self, token: &str, expires_at: i64) -> Result<(), LedgerError> {
        let token_hash = hash_token(token);

        sqlx::query(
            r#"
            INSERT INTO revoked_tokens (token_hash, expires_at)
            VALUES ($1, $2)
            "#,
        )
        .bind(&token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let msg = e.to_string();
            if msg.contains("duplicate key") || msg.contains("unique constraint") {
                LedgerError::DuplicateRecord
            } else {
                LedgerError::Storage(msg)
            }
        })?;

        Ok(())
    }

    async fn is_spent(&self, token: &str) -> Result<bool, LedgerError> {
        let token_hash = hash_token(token);

        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE token_hash = $1)",
        )
        .bind(&token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| LedgerError::Storage(e.to_string()))
    }

    async fn prune_expired(&self, now: i64) -> Result<u64, LedgerError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| LedgerError::Storage(e.to_string()))?;

        Ok(result.rows_affected())
    }
}

/// In-memory ledger for tests and ephemeral deployments. A single lock
/// around the map makes insert-if-absent atomic, mirroring the database's
/// key constraint.
#[derive(Default)]
pub struct InMemoryRevocationLedger {
    records: Mutex<HashMap<String, i64>>,
}

impl InMemoryRevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RevocationLedger for InMemoryRevocationLedger {
    async fn record_spent(&self, token: &str, expires_at: i64) -> Result<(), LedgerError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let token_hash = hash_token(token);
        if records.contains_key(&token_hash) {
            return Err(LedgerError::DuplicateRecord);
        }
        records.insert(token_hash, expires_at);

        Ok(())
    }

    async fn is_spent(&self, token: &str) -> Result<bool, LedgerError> {
        let records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        Ok(records.contains_key(&hash_token(token)))
    }

    async fn prune_expired(&self, now: i64) -> Result<u64, LedgerError> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let before = records.len();
        records.retain(|_, expires_at| *expires_at > now);

        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_hashing_is_stable() {
        let hash1 = hash_token("some-refresh-token");
        let hash2 = hash_token("some-refresh-token");

        assert_eq!(hash1, hash2);
        // SHA-256 hex digest
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, "some-refresh-token");
    }

    #[test]
    fn test_different_tokens_different_hashes() {
        assert_ne!(hash_token("token-a"), hash_token("token-b"));
    }

    #[tokio::test]
    async fn test_record_then_is_spent() {
        let ledger = InMemoryRevocationLedger::new();
        let now = chrono::Utc::now().timestamp();

        assert!(!ledger.is_spent("token-a").await.unwrap());
        ledger.record_spent("token-a", now + 3600).await.unwrap();
        assert!(ledger.is_spent("token-a").await.unwrap());
        assert!(!ledger.is_spent("token-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_record_rejected() {
        let ledger = InMemoryRevocationLedger::new();
        let now = chrono::Utc::now().timestamp();

        ledger.record_spent("token-a", now + 3600).await.unwrap();
        let second = ledger.record_spent("token-a", now + 3600).await;

        assert!(matches!(second, Err(LedgerError::DuplicateRecord)));
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_prune_removes_only_expired_records() {
        let ledger = InMemoryRevocationLedger::new();
        let now = chrono::Utc::now().timestamp();

        ledger.record_spent("expired", now - 60).await.unwrap();
        ledger.record_spent("expiring-now", now).await.unwrap();
        ledger.record_spent("live", now + 3600).await.unwrap();

        let pruned = ledger.prune_expired(now).await.unwrap();

        assert_eq!(pruned, 2);
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.is_spent("expired").await.unwrap());
        assert!(ledger.is_spent("live").await.unwrap());
    }
}
