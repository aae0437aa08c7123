//! Password verification against the OS account database.

use crate::auth::account::{AccountError, AccountStore, HashKind};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Outcome of a credential check.
///
/// Rejections are ordinary outcomes, not errors; the HTTP layer answers them
/// all the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Accepted(String),
    Rejected(RejectReason),
}

/// Why a credential check did not accept.
///
/// The distinction exists for server-side logging only; it must never reach
/// the client, or the login endpoint becomes a username oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownUser,
    BadPassword,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::UnknownUser => write!(f, "unknown user"),
            RejectReason::BadPassword => write!(f, "bad password"),
        }
    }
}

/// The credential store could not be consulted. A deployment fault, distinct
/// from any rejection.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

impl From<AccountError> for VerifyError {
    fn from(err: AccountError) -> Self {
        VerifyError::Unavailable(err.to_string())
    }
}

/// Checks a (username, password) pair against an account store.
///
/// Verification is CPU-bound (crypt rounds); callers on an async runtime
/// should run [`verify`](CredentialVerifier::verify) on the blocking pool.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn AccountStore>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// Check `password` against the stored credential for `username`.
    ///
    /// A sentinel passwd hash triggers the shadow lookup; a denied or missing
    /// shadow entry is reported as `Unavailable`, never as a non-match.
    pub fn verify(&self, username: &str, password: &str) -> Result<Verification, VerifyError> {
        let Some(record) = self.store.lookup(username)? else {
            return Ok(Verification::Rejected(RejectReason::UnknownUser));
        };

        let hash = match record.kind {
            HashKind::Inline => Zeroizing::new(record.password_hash),
            HashKind::Shadowed => match self.store.shadow_lookup(username)? {
                Some(hash) => Zeroizing::new(hash),
                // A shadowed passwd entry without a shadow row is a broken
                // deployment, not a wrong password.
                None => {
                    return Err(VerifyError::Unavailable(format!(
                        "no shadow entry for shadowed user {}",
                        username
                    )));
                }
            },
        };

        // The stored hash is self-describing ($id$salt$digest); pwhash
        // dispatches on it and compares in constant time.
        if pwhash::unix::verify(password, &hash) {
            Ok(Verification::Accepted(record.username))
        } else {
            Ok(Verification::Rejected(RejectReason::BadPassword))
        }
    }
}
