//! # Session & Flash Cookies
//!
//! | Cookie | Content |
//! |--------|---------|
//! | `session` | signed session token (see [`lib_auth::token`]) |
//! | `flash` | base64url JSON list of one-shot messages |
//! | `oauth_state` | base64url JSON [`PendingOAuth`] of a Google login in flight |
//!
//! All cookies are `HttpOnly`, `SameSite=Lax` and scoped to `/`. `Lax` keeps
//! them on the top-level redirect back from Google.

use crate::server::AppState;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use lib_auth::encode_session;
use lib_core::{AppError, Result};
use lib_utils::{b64u_decode_json, b64u_encode_json};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const SESSION_COOKIE: &str = "session";
pub const FLASH_COOKIE: &str = "flash";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

fn build_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Sign a session token for `subject` and store it in the jar.
pub fn issue_session(
    state: &AppState,
    jar: CookieJar,
    subject: &str,
    email: &str,
) -> Result<CookieJar> {
    let token = encode_session(
        subject,
        email,
        &state.config.secret_key,
        state.config.session_expiration_hours,
    )
    .map_err(crate::error::from_auth)?;

    Ok(jar.add(build_cookie(SESSION_COOKIE, token)))
}

/// Remove the session cookie.
pub fn end_session(jar: CookieJar) -> CookieJar {
    jar.remove(removal(SESSION_COOKIE))
}

/// Kept between `GET /google_login` and the callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOAuth {
    pub csrf_state: String,
    /// Chat prompt to open once logged in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

pub fn set_oauth_state(jar: CookieJar, pending: &PendingOAuth) -> Result<CookieJar> {
    let value = b64u_encode_json(pending)
        .map_err(|e| AppError::Internal(format!("oauth state encoding: {e}")))?;
    Ok(jar.add(build_cookie(OAUTH_STATE_COOKIE, value)))
}

/// Remove the pending OAuth state and return it. An unreadable cookie is
/// removed and reads as `None`.
pub fn take_oauth_state(jar: CookieJar) -> (CookieJar, Option<PendingOAuth>) {
    let Some(value) = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, None);
    };

    let pending = b64u_decode_json::<PendingOAuth>(&value)
        .map_err(|e| warn!("[OAUTH] Ignoring unreadable state cookie: {}", e))
        .ok();
    (jar.remove(removal(OAUTH_STATE_COOKIE)), pending)
}

fn read_flash(jar: &CookieJar) -> Vec<String> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| b64u_decode_json(cookie.value()).ok())
        .unwrap_or_default()
}

/// Queue a message for the next rendered page.
pub fn push_flash(jar: CookieJar, message: &str) -> CookieJar {
    let mut messages = read_flash(&jar);
    messages.push(message.to_string());

    match b64u_encode_json(&messages) {
        Ok(value) => jar.add(build_cookie(FLASH_COOKIE, value)),
        Err(e) => {
            warn!("[FLASH] Dropping message, encoding failed: {}", e);
            jar
        }
    }
}

/// Drain queued messages, removing the cookie.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Vec<String>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }
    let messages = read_flash(&jar);
    (jar.remove(removal(FLASH_COOKIE)), messages)
}
