//! Session cookie policy.
//!
//! The cookie carries only the opaque token. It is HttpOnly, same-site, and
//! browser-session scoped (no Max-Age/Expires): closing the browser is one
//! of the two ways a session ends, the other being logout.

use axum::http::{header, HeaderMap};
use cookie::time::Duration;
use cookie::{Cookie, SameSite};

/// Build the session cookie for a freshly created token.
pub fn session_cookie(name: &str, token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_owned(), token.to_owned()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Build a cookie that instructs the client to drop the session cookie.
pub fn removal_cookie(name: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((name.to_owned(), String::new()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}

/// Extract the session token from the inbound Cookie header(s), if present.
///
/// Unparseable headers or fragments yield `None` rather than an error;
/// a request without a usable cookie is simply anonymous.
pub fn token_from_headers(headers: &HeaderMap, name: &str) -> Option<String> {
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for parsed in Cookie::split_parse(value.to_owned()) {
            if let Ok(c) = parsed {
                if c.name() == name {
                    return Some(c.value().to_string());
                }
            }
        }
    }
    None
}
