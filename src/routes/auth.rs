//! Login, logout, and identity endpoints.

use crate::auth::middleware::{AppState, Identity, SessionToken};
use crate::auth::verify::Verification;
use crate::error::AppError;
use crate::models::{LoginForm, WhoamiResponse};
use crate::session::{removal_cookie, session_cookie};
use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use zeroize::Zeroizing;

/// GET /: unconditional redirect to the login page.
pub async fn index() -> Redirect {
    Redirect::to("/index.html")
}

/// GET /whoami: the resolved username, or null when anonymous.
///
/// Always 200; being logged out is a normal answer, not an error status.
pub async fn whoami(identity: Identity) -> Result<impl IntoResponse, AppError> {
    let body = serde_json::to_string(&WhoamiResponse { d: identity.0 })?;
    Ok((
        [(header::CONTENT_TYPE, "application/json; charset=utf-8")],
        body,
    ))
}

/// POST /login: verify the form credentials against the OS account store.
///
/// Every verification outcome redirects to /index.html; only a successful
/// one also sets the session cookie. Unknown-user and wrong-password
/// responses are identical so the endpoint cannot be used to enumerate
/// accounts. Credential-store or session-backend faults fail the request
/// instead of masquerading as a rejection.
pub async fn login(
    State(state): State<AppState>,
    SessionToken(old_token): SessionToken,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let verifier = state.verifier.clone();
    let name = form.user_name.clone();
    let password = Zeroizing::new(form.password);

    // crypt rounds are CPU-bound; keep them off the async workers
    let verdict = tokio::task::spawn_blocking(move || verifier.verify(&name, &password))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {}", e)))??;

    match verdict {
        Verification::Accepted(username) => {
            // Last login wins: drop any session the client already had
            // before binding the new one.
            state.sessions.destroy(old_token.as_deref()).await?;
            let token = state.sessions.create(&username).await?;

            tracing::info!(action = "login", user = %username, "login succeeded");

            let cookie = session_cookie(
                &state.config.session_cookie,
                &token,
                state.config.cookie_secure,
            );
            Ok((
                AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
                Redirect::to("/index.html"),
            )
                .into_response())
        }
        Verification::Rejected(reason) => {
            tracing::info!(action = "login_failed", user = %form.user_name, reason = %reason, "login rejected");
            Ok(Redirect::to("/index.html").into_response())
        }
    }
}

/// POST /logout: destroy the current session, if any.
///
/// Idempotent: a request without a session still answers 200 and clears the
/// cookie.
pub async fn logout(
    State(state): State<AppState>,
    SessionToken(token): SessionToken,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.destroy(token.as_deref()).await?;

    tracing::info!(action = "logout", "session cleared");

    let cookie = removal_cookie(&state.config.session_cookie, state.config.cookie_secure);
    Ok((
        StatusCode::OK,
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
    ))
}
