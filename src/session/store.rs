//! Session persistence backends.
//!
//! One record per active token. The file store keeps each record as a JSON
//! file named after the token inside a dedicated directory; the memory store
//! backs unit tests.

use crate::models::StoredSession;
use crate::session::valid_token;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Persistence failures. Missing records are not errors; they surface as
/// `Ok(None)` / `Ok(false)` from the trait methods.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session record decode error: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("invalid session token")]
    InvalidToken,
}

/// Durable key→record store addressed by the opaque session token.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a record, replacing any record under the same token.
    async fn put(&self, session: &StoredSession) -> Result<(), StoreError>;

    /// Fetch the record for `token`, if any.
    async fn get(&self, token: &str) -> Result<Option<StoredSession>, StoreError>;

    /// Delete the record for `token`. Returns whether a record existed.
    async fn delete(&self, token: &str) -> Result<bool, StoreError>;
}

// ============================================================================
// File store
// ============================================================================

/// Session store with one JSON file per token.
///
/// Writes go to a `.tmp` sibling first and are renamed into place. Tokens
/// are used as file names, so anything outside the token alphabet is refused
/// before it can reach the filesystem.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn record_path(&self, token: &str) -> Option<PathBuf> {
        if !valid_token(token) {
            return None;
        }
        Some(self.dir.join(format!("{}.json", token)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn put(&self, session: &StoredSession) -> Result<(), StoreError> {
        let path = self
            .record_path(&session.token)
            .ok_or(StoreError::InvalidToken)?;
        let json = serde_json::to_string(session)?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<StoredSession>, StoreError> {
        let Some(path) = self.record_path(token) else {
            return Ok(None);
        };
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let session = serde_json::from_slice(&bytes)?;
                Ok(Some(session))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, token: &str) -> Result<bool, StoreError> {
        let Some(path) = self.record_path(token) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Memory store
// ============================================================================

/// In-process session store for tests.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, StoredSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, session: &StoredSession) -> Result<(), StoreError> {
        if !valid_token(&session.token) {
            return Err(StoreError::InvalidToken);
        }
        self.sessions
            .write()
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<StoredSession>, StoreError> {
        Ok(self.sessions.read().get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().remove(token).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::generate_session_token;

    fn sample_session(token: &str) -> StoredSession {
        StoredSession {
            token: token.to_string(),
            username: "alice".to_string(),
            created_at: 1_700_000_000,
            expires_at: 1_700_086_400,
        }
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        let token = generate_session_token();

        store.put(&sample_session(&token)).await.unwrap();

        let session = store.get(&token).await.unwrap().unwrap();
        assert_eq!(session.username, "alice");
        assert_eq!(session.token, token);

        assert!(store.delete(&token).await.unwrap());
        assert!(store.get(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_missing_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();

        assert!(store.get(&generate_session_token()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        let token = generate_session_token();

        store.put(&sample_session(&token)).await.unwrap();
        assert!(store.delete(&token).await.unwrap());
        assert!(!store.delete(&token).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_store_refuses_tokens_outside_alphabet() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();

        // Would otherwise address files outside the session directory.
        assert!(store.get("../../etc/passwd").await.unwrap().is_none());
        assert!(!store.delete("../../etc/passwd").await.unwrap());

        let result = store.put(&sample_session("../escape")).await;
        assert!(matches!(result, Err(StoreError::InvalidToken)));
    }

    #[tokio::test]
    async fn test_file_store_corrupt_record_is_backend_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        let token = generate_session_token();

        std::fs::write(dir.path().join(format!("{}.json", token)), "not json").unwrap();

        let result = store.get(&token).await;
        assert!(matches!(result, Err(StoreError::Codec(_))));
    }

    #[tokio::test]
    async fn test_file_store_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/sessions");
        let store = FileSessionStore::open(&nested).unwrap();
        let token = generate_session_token();

        store.put(&sample_session(&token)).await.unwrap();
        assert!(nested.join(format!("{}.json", token)).exists());
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemorySessionStore::new();
        let token = generate_session_token();

        store.put(&sample_session(&token)).await.unwrap();
        assert_eq!(
            store.get(&token).await.unwrap().unwrap().username,
            "alice"
        );
        assert!(store.delete(&token).await.unwrap());
        assert!(!store.delete(&token).await.unwrap());
    }
}
