//! Authgate application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Open the file-backed session store
//! 3. Build the credential verifier over the system account database
//! 4. Build router with auth routes + static file serving
//! 5. Apply security headers middleware
//! 6. Start Axum server

use authgate::{
    auth::{middleware::AppState, CredentialVerifier, SystemAccountStore},
    config::Config,
    middleware::security_headers,
    routes,
    session::{FileSessionStore, SessionManager},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

#[tokio::main]
async fn main() {
    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting authgate on {}", config.bind_addr);

    // Open the session store (creates the directory on first run)
    let store =
        FileSessionStore::open(&config.session_dir).expect("Failed to open session store");
    let sessions = SessionManager::new(Arc::new(store), config.session_ttl_secs);

    // The verifier reads the host's passwd/shadow databases. Shadow entries
    // need read privilege; without it every login for a shadowed account
    // fails as an operational fault rather than a rejection.
    let verifier = CredentialVerifier::new(Arc::new(SystemAccountStore::new()));

    // Build shared state
    let state = AppState {
        verifier,
        sessions,
        config: Arc::new(config.clone()),
    };

    // Build router:
    // - Auth routes (with state)
    // - Static file serving (fallback)
    // - Security headers middleware
    // Explicit CORS: deny all cross-origin requests (single-origin deployment).
    let cors = CorsLayer::new();

    let app = routes::router()
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(cors)
        .layer(axum::middleware::from_fn(security_headers))
        .with_state(state);

    // Bind to configured address
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl-C handler");
    tracing::info!("Shutting down");
}
