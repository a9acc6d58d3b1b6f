/// Session module
///
/// The token/session core: credential codec, revocation ledger, session
/// issuance, authentication, and refresh token rotation, plus password
/// hashing for the signup/signin paths.

mod claims;
mod codec;
mod ledger;
mod manager;
mod password;

pub use claims::Claims;
pub use codec::{TokenCodec, TokenKind};
pub use ledger::{InMemoryRevocationLedger, LedgerError, PgRevocationLedger, RevocationLedger};
pub use manager::{SessionManager, TokenPair};
pub use password::{hash_password, verify_password};
