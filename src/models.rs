//! Request, response, and storage models.
//!
//! All models use serde. `StoredSession` is the on-disk session record;
//! the rest are wire shapes.

use serde::{Deserialize, Serialize};

// ============================================================================
// Auth Models
// ============================================================================

/// Login form body.
///
/// Field names match the login page's form inputs. Missing fields behave as
/// empty strings so a malformed submission takes the same rejection path as a
/// wrong password.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(rename = "UserName", default)]
    pub user_name: String,
    #[serde(rename = "Password", default)]
    pub password: String,
}

/// Body of `GET /whoami`: the resolved username, or null when anonymous.
#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub d: Option<String>,
}

// ============================================================================
// Storage Models
// ============================================================================

/// Session data as persisted by the session store.
///
/// Timestamps are unix seconds. `expires_at` is enforced on resolve; a record
/// past it reads as no session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub token: String,
    pub username: String,
    pub created_at: u64,
    pub expires_at: u64,
}
