//! Authentication layer: OS credential verification and request identity.

pub mod account;
pub mod middleware;
pub mod verify;

pub use account::{
    AccountError, AccountStore, CredentialRecord, HashKind, MemoryAccountStore, SystemAccountStore,
};
pub use middleware::{AppState, Identity, SessionToken};
pub use verify::{CredentialVerifier, RejectReason, Verification, VerifyError};
