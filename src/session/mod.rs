//! Server-side session lifecycle.
//!
//! A session binds an opaque token to a username: `create` binds, `destroy`
//! unbinds, `resolve` reads. There are no other transitions; logging in
//! again always goes through `create`.

pub mod cookie;
pub mod store;

pub use cookie::{removal_cookie, session_cookie, token_from_headers};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, StoreError};

use crate::models::StoredSession;
use base64::{engine::general_purpose, Engine as _};
use rand::Rng;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Longest token accepted from the wire. Generated tokens are 43 characters.
const MAX_TOKEN_LEN: usize = 128;

/// Generate a cryptographically random session token.
///
/// Returns a URL-safe base64 string (43 characters, no padding) from 32
/// random bytes. The alphabet is filesystem-safe so a token can double as a
/// file name in the file-backed store.
pub fn generate_session_token() -> String {
    let mut rng = rand::rng();
    let mut bytes = [0u8; 32];
    rng.fill(&mut bytes);
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Whether a wire-supplied token is within the token alphabet.
pub fn valid_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Creates, resolves, and destroys sessions over a persistence backend.
///
/// Only whole-record create/delete; records are never updated in place, so
/// no locking is needed at this layer.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl_secs: u64,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl_secs: u64) -> Self {
        Self { store, ttl_secs }
    }

    /// Allocate a fresh token bound to `username` and persist the record.
    pub async fn create(&self, username: &str) -> Result<String, StoreError> {
        let token = generate_session_token();
        let now = unix_now();
        let session = StoredSession {
            token: token.clone(),
            username: username.to_string(),
            created_at: now,
            expires_at: now.saturating_add(self.ttl_secs),
        };
        self.store.put(&session).await?;
        tracing::debug!(user = %username, "session created");
        Ok(token)
    }

    /// Resolve a token to a username.
    ///
    /// Absent, malformed, unknown, or expired tokens are the normal
    /// anonymous outcome, never an error. An expired record is deleted on
    /// the way out. Only backend I/O failures surface as `Err`.
    pub async fn resolve(&self, token: Option<&str>) -> Result<Option<String>, StoreError> {
        let Some(token) = token else {
            return Ok(None);
        };
        if !valid_token(token) {
            return Ok(None);
        }
        match self.store.get(token).await? {
            Some(session) if session.expires_at > unix_now() => Ok(Some(session.username)),
            Some(session) => {
                self.store.delete(&session.token).await?;
                Ok(None)
            }
            None => Ok(None),
        }
    }

    /// Delete the record for `token` if one exists. A no-op, not an error,
    /// for absent or unknown tokens.
    pub async fn destroy(&self, token: Option<&str>) -> Result<(), StoreError> {
        let Some(token) = token else {
            return Ok(());
        };
        if !valid_token(token) {
            return Ok(());
        }
        if self.store.delete(token).await? {
            tracing::debug!("session destroyed");
        }
        Ok(())
    }
}
