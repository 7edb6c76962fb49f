//! # Authentication Middleware
//!
//! Resolves the `session` cookie to a [`CurrentUser`] and guards the chat
//! routes.
//!
//! - [`require_login`]: page routes. Anonymous visitors are redirected
//!   (303) to `/login`; a pending `?prompt=` is carried over so the login
//!   form can send them back to it.
//! - [`require_login_api`]: `POST /send_message`. Anonymous callers get
//!   `401` with a `bot_response` the chat page can display.
//!
//! Handlers behind either guard extract the user with
//! `Extension<CurrentUser>`.

use crate::server::{AppState, AuthBackend};
use crate::session::SESSION_COOKIE;
use axum::{
    extract::{Query, Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use lib_auth::decode_session;
use lib_core::dto::{ChatbotQuery, SendMessageResponse};
use lib_core::model::store::UserRepository;
use serde::Serialize;
use tracing::{debug, error, warn};

pub const LOGIN_REQUIRED_REPLY: &str = "Please log in to chat.";

/// The logged-in user, as seen by templates and handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    /// Session subject: the row id for local accounts, the email for Google.
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Look up the user behind the request's session cookie.
///
/// Returns `None` for a missing, expired or forged token, and for a token
/// whose user no longer exists (deleted row, or a Google cache emptied by a
/// restart).
pub async fn resolve_user(state: &AppState, jar: &CookieJar) -> Option<CurrentUser> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();

    let claims = match decode_session(&token, &state.config.secret_key) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("[AUTH] Ignoring session cookie: {}", e);
            return None;
        }
    };

    match &state.auth {
        AuthBackend::Local(pool) => {
            let id = claims.sub.parse::<i64>().ok()?;
            match UserRepository::find_by_id(pool, id).await {
                Ok(Some(user)) => Some(CurrentUser {
                    id: user.id.to_string(),
                    email: user.email,
                    name: None,
                    picture: None,
                }),
                Ok(None) => {
                    warn!("[AUTH] Session refers to unknown user id {}", id);
                    None
                }
                Err(e) => {
                    error!("[AUTH] User lookup failed: {}", e);
                    None
                }
            }
        }
        AuthBackend::Google { users, .. } => {
            let user = users.get(&claims.sub).await;
            if user.is_none() {
                debug!("[AUTH] Session email {} not in user cache", claims.sub);
            }
            user.map(|u| CurrentUser {
                id: u.email.clone(),
                email: u.email,
                name: u.name,
                picture: u.picture,
            })
        }
    }
}

/// Login target for an anonymous request, keeping a pending chat prompt.
fn login_redirect(uri: &Uri) -> String {
    let prompt = Query::<ChatbotQuery>::try_from_uri(uri)
        .map(|Query(q)| q.prompt)
        .unwrap_or_default();

    if uri.path() == "/chatbot" && !prompt.is_empty() {
        format!("/login?next=chatbot&prompt={}", urlencoding::encode(&prompt))
    } else {
        "/login".to_string()
    }
}

/// Guard for HTML pages.
pub async fn require_login(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, &jar).await {
        Some(user) => {
            debug!("[AUTH] Authenticated user: {}", user.email);
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => {
            debug!("[AUTH] Anonymous request to {}, redirecting to login", req.uri().path());
            Redirect::to(&login_redirect(req.uri())).into_response()
        }
    }
}

/// Guard for the JSON chat endpoint.
pub async fn require_login_api(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_user(&state, &jar).await {
        Some(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            Json(SendMessageResponse::new(LOGIN_REQUIRED_REPLY)),
        )
            .into_response(),
    }
}
