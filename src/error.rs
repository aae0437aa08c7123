//! Error types and Axum response conversions.
//!
//! Every variant here is an operational fault. Login rejections are not
//! errors at all (they redirect like a success, see the routes), and a
//! missing session is the normal anonymous outcome.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application error types.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Internal error: {0}")]
    Internal(String),

    /// The OS credential store could not answer (e.g. the shadow database is
    /// unreadable). A deployment fault, never a login rejection.
    #[error("Credential verifier unavailable: {0}")]
    VerifierUnavailable(String),

    /// The session persistence backend failed an I/O operation.
    #[error("Session backend unavailable: {0}")]
    SessionUnavailable(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log detailed error server-side, return a generic message to the
        // client. None of these variants carries user-safe text.
        match &self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
            }
            AppError::VerifierUnavailable(msg) => {
                tracing::error!(error = %msg, "Credential verifier unavailable");
            }
            AppError::SessionUnavailable(msg) => {
                tracing::error!(error = %msg, "Session backend unavailable");
            }
        }

        let body = Json(json!({
            "error": "Internal server error"
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

// Convenience conversions from lower-layer error types
impl From<crate::session::store::StoreError> for AppError {
    fn from(err: crate::session::store::StoreError) -> Self {
        AppError::SessionUnavailable(err.to_string())
    }
}

impl From<crate::auth::verify::VerifyError> for AppError {
    fn from(err: crate::auth::verify::VerifyError) -> Self {
        AppError::VerifierUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}
