/// Credential codec: minting and parsing of signed, time-bounded tokens.
///
/// Both token kinds are HS256-signed JWTs over the same symmetric secret;
/// the kind only determines the embedded lifetime. Every parse failure
/// (bad signature, malformed payload, expired) collapses to the same
/// invalid-credential error so callers cannot learn which check failed;
/// the underlying reason is logged for diagnostics.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};
use crate::session::claims::Claims;

/// Which lifetime a minted token gets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
}

impl TokenCodec {
    /// Build a codec from explicit settings. No process-wide state: each
    /// codec carries its own secret and lifetimes, so tests can run with
    /// distinct instances.
    pub fn new(settings: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // The embedded expiry is authoritative; no clock-skew allowance.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            validation,
            access_token_expiry: settings.access_token_expiry,
            refresh_token_expiry: settings.refresh_token_expiry,
        }
    }

    /// Mint a signed token for the subject with the lifetime of `kind`.
    pub fn mint(&self, subject: Uuid, kind: TokenKind) -> Result<String, AppError> {
        let lifetime = match kind {
            TokenKind::Access => self.access_token_expiry,
            TokenKind::Refresh => self.refresh_token_expiry,
        };
        let claims = Claims::new(subject, lifetime);

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token minting failed: {}", e)))
    }

    /// Verify signature and expiry, returning the embedded claims.
    ///
    /// Any failure maps to the single invalid-credential error kind.
    pub fn parse(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::warn!(reason = %e, "Token verification failed");
            AppError::Auth(AuthError::InvalidCredential)
        })?;

        // jsonwebtoken treats a token expiring this exact second as still
        // valid; the contract here is exclusive expiry.
        if data.claims.is_expired() {
            tracing::warn!("Token verification failed: expired");
            return Err(AppError::Auth(AuthError::InvalidCredential));
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_settings() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        }
    }

    #[test]
    fn test_mint_and_parse_round_trip() {
        let codec = TokenCodec::new(&test_settings());
        let subject = Uuid::new_v4();

        let token = codec
            .mint(subject, TokenKind::Access)
            .expect("Failed to mint token");
        let claims = codec.parse(&token).expect("Failed to parse token");

        assert_eq!(claims.subject_id().unwrap(), subject);
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let codec = TokenCodec::new(&test_settings());
        let subject = Uuid::new_v4();

        let access = codec.parse(&codec.mint(subject, TokenKind::Access).unwrap()).unwrap();
        let refresh = codec.parse(&codec.mint(subject, TokenKind::Refresh).unwrap()).unwrap();

        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_garbage_token_rejected() {
        let codec = TokenCodec::new(&test_settings());
        let result = codec.parse("garbage-string");

        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidCredential))));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = TokenCodec::new(&test_settings());
        let token = codec.mint(Uuid::new_v4(), TokenKind::Access).unwrap();

        let tampered = format!("{}X", token);
        assert!(codec.parse(&tampered).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let codec = TokenCodec::new(&test_settings());
        let other = TokenCodec::new(&JwtSettings {
            secret: "a-completely-different-secret-of-32-chars!".to_string(),
            access_token_expiry: 3600,
            refresh_token_expiry: 604800,
        });

        let token = other.mint(Uuid::new_v4(), TokenKind::Access).unwrap();
        let result = codec.parse(&token);

        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidCredential))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let settings = test_settings();
        let codec = TokenCodec::new(&settings);

        // Craft a token whose expiry is an hour in the past, signed with
        // the codec's own secret.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(settings.secret.as_bytes()),
        )
        .unwrap();

        let result = codec.parse(&token);
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidCredential))));
    }

    #[test]
    fn test_minted_tokens_are_distinct() {
        let codec = TokenCodec::new(&test_settings());
        let subject = Uuid::new_v4();

        let a = codec.mint(subject, TokenKind::Refresh).unwrap();
        let b = codec.mint(subject, TokenKind::Refresh).unwrap();

        assert_ne!(a, b);
    }
}
