//! OS account database access.
//!
//! `AccountStore` is the seam between the credential verifier and the
//! system's passwd/shadow databases. `SystemAccountStore` reads the real
//! ones through libc; `MemoryAccountStore` is an in-process store for tests
//! and fixtures.

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// Hash values in the passwd file that mean "the real hash lives in the
/// shadow database".
const SHADOW_SENTINELS: [&str; 2] = ["x", "*"];

/// Largest lookup buffer we are willing to grow to before giving up.
const MAX_LOOKUP_BUF: usize = 1 << 20;

/// How a credential record carries its hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    /// The passwd entry holds the hash itself.
    Inline,
    /// The passwd entry holds a sentinel; the hash must come from the
    /// shadow store.
    Shadowed,
}

/// A username-to-password-hash mapping as read from the account database.
///
/// When `kind` is `Shadowed`, `password_hash` is the sentinel and MUST NOT
/// be used for verification.
#[derive(Clone)]
pub struct CredentialRecord {
    pub username: String,
    pub password_hash: String,
    pub kind: HashKind,
}

impl CredentialRecord {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let password_hash = password_hash.into();
        let kind = if SHADOW_SENTINELS.contains(&password_hash.as_str()) {
            HashKind::Shadowed
        } else {
            HashKind::Inline
        };
        Self {
            username: username.into(),
            password_hash,
            kind,
        }
    }
}

/// Account database failures.
///
/// `Denied` means the store exists but refused us (typically a process
/// without shadow read privilege); `Lookup` is any other failure. Neither is
/// a statement about the user's password.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("account lookup denied: {0}")]
    Denied(String),

    #[error("account lookup failed: {0}")]
    Lookup(String),
}

/// Read-only view of the OS account database.
pub trait AccountStore: Send + Sync {
    /// Fetch the primary credential record for `username`.
    /// `Ok(None)` means no such user.
    fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, AccountError>;

    /// Fetch the privileged shadow hash for `username`.
    /// `Ok(None)` means the shadow database has no row for the user.
    fn shadow_lookup(&self, username: &str) -> Result<Option<String>, AccountError>;
}

// ============================================================================
// System store (libc passwd/shadow)
// ============================================================================

/// Account store backed by the host's passwd and shadow databases via
/// `getpwnam_r` / `getspnam_r`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAccountStore;

impl SystemAccountStore {
    pub fn new() -> Self {
        Self
    }
}

impl AccountStore for SystemAccountStore {
    fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, AccountError> {
        // A NUL byte cannot occur in a passwd entry name.
        let Ok(c_name) = CString::new(username) else {
            return Ok(None);
        };

        let mut buf = vec![0u8; initial_buf_len()];
        loop {
            let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::passwd = std::ptr::null_mut();
            let rc = unsafe {
                libc::getpwnam_r(
                    c_name.as_ptr(),
                    &mut pwd,
                    buf.as_mut_ptr() as *mut c_char,
                    buf.len(),
                    &mut result,
                )
            };

            if rc == libc::ERANGE {
                if buf.len() >= MAX_LOOKUP_BUF {
                    return Err(AccountError::Lookup(format!(
                        "passwd entry for {} exceeds {} bytes",
                        username, MAX_LOOKUP_BUF
                    )));
                }
                buf.resize(buf.len() * 2, 0);
                continue;
            }

            if result.is_null() {
                // glibc reports "no such user" as rc 0 or one of the ENOENT
                // family depending on the NSS backend.
                return match rc {
                    0 | libc::ENOENT | libc::ESRCH | libc::EBADF | libc::EPERM => Ok(None),
                    _ => Err(AccountError::Lookup(os_error(rc, "getpwnam_r"))),
                };
            }

            if pwd.pw_passwd.is_null() {
                return Err(AccountError::Lookup(format!(
                    "passwd entry for {} has no hash field",
                    username
                )));
            }
            let hash = unsafe { CStr::from_ptr(pwd.pw_passwd) }
                .to_string_lossy()
                .into_owned();
            return Ok(Some(CredentialRecord::new(username, hash)));
        }
    }

    fn shadow_lookup(&self, username: &str) -> Result<Option<String>, AccountError> {
        let Ok(c_name) = CString::new(username) else {
            return Ok(None);
        };

        let mut buf = vec![0u8; initial_buf_len()];
        loop {
            let mut spwd: libc::spwd = unsafe { std::mem::zeroed() };
            let mut result: *mut libc::spwd = std::ptr::null_mut();
            let rc = unsafe {
                libc::getspnam_r(
                    c_name.as_ptr(),
                    &mut spwd,
                    buf.as_mut_ptr() as *mut c_char,
                    buf.len(),
                    &mut result,
                )
            };

            if rc == libc::ERANGE {
                if buf.len() >= MAX_LOOKUP_BUF {
                    return Err(AccountError::Lookup(format!(
                        "shadow entry for {} exceeds {} bytes",
                        username, MAX_LOOKUP_BUF
                    )));
                }
                buf.resize(buf.len() * 2, 0);
                continue;
            }

            if result.is_null() {
                return match rc {
                    // Reading /etc/shadow without privilege.
                    libc::EACCES | libc::EPERM => {
                        Err(AccountError::Denied(os_error(rc, "getspnam_r")))
                    }
                    0 | libc::ENOENT | libc::ESRCH | libc::EBADF => Ok(None),
                    _ => Err(AccountError::Lookup(os_error(rc, "getspnam_r"))),
                };
            }

            if spwd.sp_pwdp.is_null() {
                return Ok(None);
            }
            let hash = unsafe { CStr::from_ptr(spwd.sp_pwdp) }
                .to_string_lossy()
                .into_owned();
            return Ok(Some(hash));
        }
    }
}

fn initial_buf_len() -> usize {
    let len = unsafe { libc::sysconf(libc::_SC_GETPW_R_SIZE_MAX) };
    if len <= 0 {
        1024
    } else {
        len as usize
    }
}

fn os_error(rc: i32, call: &str) -> String {
    format!("{}: {}", call, std::io::Error::from_raw_os_error(rc))
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-process account store.
///
/// Used as the injectable fixture in unit and integration tests; behaves
/// like the system store, including the sentinel/shadow indirection.
#[derive(Default)]
pub struct MemoryAccountStore {
    passwd: HashMap<String, String>,
    shadow: HashMap<String, String>,
    shadow_denied: bool,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user whose hash lives directly in the passwd record.
    pub fn add_user(&mut self, username: &str, hash: &str) {
        self.passwd.insert(username.to_string(), hash.to_string());
    }

    /// Add a user with a sentinel passwd record and the real hash in the
    /// shadow store.
    pub fn add_shadowed_user(&mut self, username: &str, hash: &str) {
        self.passwd.insert(username.to_string(), "x".to_string());
        self.shadow.insert(username.to_string(), hash.to_string());
    }

    /// Make every shadow lookup report `AccountError::Denied`, as an
    /// unprivileged process would see.
    pub fn deny_shadow(&mut self) {
        self.shadow_denied = true;
    }
}

impl AccountStore for MemoryAccountStore {
    fn lookup(&self, username: &str) -> Result<Option<CredentialRecord>, AccountError> {
        Ok(self
            .passwd
            .get(username)
            .map(|hash| CredentialRecord::new(username, hash.clone())))
    }

    fn shadow_lookup(&self, username: &str) -> Result<Option<String>, AccountError> {
        if self.shadow_denied {
            return Err(AccountError::Denied(
                "shadow store access denied".to_string(),
            ));
        }
        Ok(self.shadow.get(username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_hashes_are_shadowed() {
        assert_eq!(CredentialRecord::new("a", "x").kind, HashKind::Shadowed);
        assert_eq!(CredentialRecord::new("a", "*").kind, HashKind::Shadowed);
    }

    #[test]
    fn test_real_hashes_are_inline() {
        let rec = CredentialRecord::new("a", "$6$salt$digest");
        assert_eq!(rec.kind, HashKind::Inline);
        // "xx" is not the sentinel
        assert_eq!(CredentialRecord::new("a", "xx").kind, HashKind::Inline);
    }

    #[test]
    fn test_memory_store_lookup() {
        let mut store = MemoryAccountStore::new();
        store.add_user("alice", "$6$salt$digest");

        let rec = store.lookup("alice").unwrap().unwrap();
        assert_eq!(rec.username, "alice");
        assert_eq!(rec.password_hash, "$6$salt$digest");
        assert_eq!(rec.kind, HashKind::Inline);

        assert!(store.lookup("bob").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_shadow_indirection() {
        let mut store = MemoryAccountStore::new();
        store.add_shadowed_user("alice", "$6$salt$digest");

        let rec = store.lookup("alice").unwrap().unwrap();
        assert_eq!(rec.kind, HashKind::Shadowed);
        assert_eq!(rec.password_hash, "x");

        let hash = store.shadow_lookup("alice").unwrap().unwrap();
        assert_eq!(hash, "$6$salt$digest");
        assert!(store.shadow_lookup("bob").unwrap().is_none());
    }

    #[test]
    fn test_memory_store_shadow_denied() {
        let mut store = MemoryAccountStore::new();
        store.add_shadowed_user("alice", "$6$salt$digest");
        store.deny_shadow();

        let err = store.shadow_lookup("alice").unwrap_err();
        assert!(matches!(err, AccountError::Denied(_)));
    }

    #[test]
    fn test_system_store_unknown_user() {
        let store = SystemAccountStore::new();
        let result = store.lookup("authgate-no-such-user-fixture");
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_system_store_nul_in_username() {
        let store = SystemAccountStore::new();
        assert!(store.lookup("ali\0ce").unwrap().is_none());
        assert!(store.shadow_lookup("ali\0ce").unwrap().is_none());
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_system_store_root_exists() {
        let store = SystemAccountStore::new();
        let rec = store.lookup("root").unwrap().expect("root should exist");
        assert_eq!(rec.username, "root");
        assert!(!rec.password_hash.is_empty());
    }
}
