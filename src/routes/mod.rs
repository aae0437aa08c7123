//! HTTP route handlers.

pub mod auth;

use crate::auth::middleware::AppState;
use axum::{routing::get, routing::post, Router};

/// Build the router with the authentication endpoints.
///
/// Static file serving is attached by the caller as the fallback service,
/// along with the middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::index))
        .route("/whoami", get(auth::whoami))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}
