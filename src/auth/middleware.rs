//! Shared application state and request extractors.

use crate::auth::verify::CredentialVerifier;
use crate::config::Config;
use crate::error::AppError;
use crate::session::{token_from_headers, SessionManager};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::convert::Infallible;
use std::sync::Arc;

/// Application state shared across handlers.
///
/// Both components are constructed once at startup and passed in here; there
/// are no process-global singletons.
#[derive(Clone)]
pub struct AppState {
    pub verifier: CredentialVerifier,
    pub sessions: SessionManager,
    pub config: Arc<Config>,
}

/// The raw session token from the inbound cookie, if any.
///
/// Extraction never fails; a request without a cookie simply carries `None`.
pub struct SessionToken(pub Option<String>);

impl FromRequestParts<AppState> for SessionToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(SessionToken(token_from_headers(
            &parts.headers,
            &state.config.session_cookie,
        )))
    }
}

/// The resolved identity for a request: `Some(username)` or `None`.
///
/// Anonymous is a normal outcome, not a rejection; the only failure mode is
/// the session backend itself being unavailable.
pub struct Identity(pub Option<String>);

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers, &state.config.session_cookie);
        let username = state.sessions.resolve(token.as_deref()).await?;
        Ok(Identity(username))
    }
}
