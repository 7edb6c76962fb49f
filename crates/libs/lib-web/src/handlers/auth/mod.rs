//! # Authentication Handlers
//!
//! Email/password accounts (`AUTH_MODE=local`) plus the session endpoints
//! shared by both modes.
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /login` | [`login_page`] |
//! | `POST /login` | [`login`] |
//! | `GET /signup` | [`signup_page`] |
//! | `POST /signup` | [`signup`] |
//! | `GET /logout` | [`logout`] (both modes) |
//! | `GET /check_login_status` | [`check_login_status`] (both modes) |
//!
//! Form failures never produce an error page: the handler queues a flash
//! message and redirects back to a form.

#[cfg(test)]
mod tests;

use crate::error::from_auth;
use crate::middleware::resolve_user;
use crate::server::AppState;
use crate::session::{end_session, issue_session, push_flash, take_flash};
use axum::{
    extract::{Form, Query, State},
    response::{Html, Redirect},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use lib_auth::{hash_password, verify_password, MIN_PASSWORD_LEN};
use lib_core::dto::{LoginForm, LoginQuery, LoginStatus, SignupForm};
use lib_core::model::store::user_repository::is_unique_violation;
use lib_core::model::store::{UserForCreate, UserRepository};
use lib_core::{AppError, Result};
use lib_utils::{normalize_email, validate_email, validate_not_empty};
use minijinja::context;
use tracing::{debug, error, info, instrument, warn};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials. Please try again or sign up.";
pub const USER_EXISTS: &str = "User already exists. Please log in.";
pub const SIGNUP_SUCCESS: &str = "Sign up successful. Please log in.";

/// `path` carrying the pending chat prompt of `query`, if any.
pub(crate) fn with_continuation(path: &str, query: &LoginQuery) -> String {
    match query.chatbot_prompt() {
        Some(prompt) => format!("{path}?next=chatbot&prompt={}", urlencoding::encode(prompt)),
        None => path.to_string(),
    }
}

/// Where a successful login lands.
pub(crate) fn chat_target(prompt: Option<&str>) -> String {
    match prompt {
        Some(prompt) => format!("/chatbot?prompt={}", urlencoding::encode(prompt)),
        None => "/chatbot".to_string(),
    }
}

/// Both form fields must be filled in before anything else is checked.
fn require_fields(email: &str, password: &str) -> std::result::Result<(), String> {
    validate_not_empty(email, "Email")?;
    validate_not_empty(password, "Password")
}

/// `GET /login`
pub async fn login_page(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let user = resolve_user(&state, &jar).await;
    let (jar, flashes) = take_flash(jar);

    let page = state.templates.render(
        "login.html",
        context! {
            user,
            flashes,
            action => with_continuation("/login", &query),
            auth_mode => state.auth_mode().as_str(),
        },
    )?;

    Ok((jar, page))
}

/// `POST /login`
///
/// A stored hash that cannot be parsed is logged and treated as a wrong
/// password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect)> {
    if let Err(msg) = require_fields(&form.email, &form.password) {
        warn!("[LOGIN] Rejected form: {}", msg);
        return Ok((push_flash(jar, &msg), Redirect::to("/login")));
    }

    let email = normalize_email(&form.email);
    info!("[LOGIN] Login attempt for {}", email);

    let user = UserRepository::find_by_email(state.pool()?, &email).await?;

    let authenticated = user.filter(|user| {
        match verify_password(&form.password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                error!("[LOGIN] Stored hash for user {} is unusable: {}", user.id, e);
                false
            }
        }
    });

    let Some(user) = authenticated else {
        warn!("[LOGIN] Invalid credentials for {}", email);
        return Ok((push_flash(jar, INVALID_CREDENTIALS), Redirect::to("/login")));
    };

    let jar = issue_session(&state, jar, &user.id.to_string(), &user.email)?;
    info!("[LOGIN] User {} logged in", user.id);

    Ok((jar, Redirect::to(&chat_target(query.chatbot_prompt()))))
}

/// `GET /signup`
pub async fn signup_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let user = resolve_user(&state, &jar).await;
    let (jar, flashes) = take_flash(jar);

    let page = state.templates.render(
        "signup.html",
        context! {
            user,
            flashes,
            min_password_len => MIN_PASSWORD_LEN,
            auth_mode => state.auth_mode().as_str(),
        },
    )?;

    Ok((jar, page))
}

/// `POST /signup`
///
/// Duplicate email goes back to `/login`, invalid input back to `/signup`.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<SignupForm>,
) -> Result<(CookieJar, Redirect)> {
    let pool = state.pool()?;
    let email = normalize_email(&form.email);
    info!("[SIGNUP] New signup request for {}", email);

    if let Err(msg) = require_fields(&form.email, &form.password) {
        warn!("[SIGNUP] Rejected form: {}", msg);
        return Ok((push_flash(jar, &msg), Redirect::to("/signup")));
    }

    if let Err(msg) = validate_email(&email) {
        warn!("[SIGNUP] Rejected email {:?}: {}", email, msg);
        return Ok((push_flash(jar, &msg), Redirect::to("/signup")));
    }

    if UserRepository::find_by_email(pool, &email).await?.is_some() {
        warn!("[SIGNUP] Email already registered: {}", email);
        return Ok((push_flash(jar, USER_EXISTS), Redirect::to("/login")));
    }

    debug!("[SIGNUP] Hashing password...");
    let password_hash = match hash_password(&form.password) {
        Ok(hash) => hash,
        Err(e @ lib_auth::Error::WeakPassword(_)) => {
            warn!("[SIGNUP] {}", e);
            return Ok((push_flash(jar, &from_auth(e).user_message()), Redirect::to("/signup")));
        }
        Err(e) => return Err(from_auth(e)),
    };

    match UserRepository::create(pool, UserForCreate::new(email.clone(), password_hash)).await {
        Ok(user) => {
            info!("[SIGNUP] User {} created ({})", user.id, user.email);
            Ok((push_flash(jar, SIGNUP_SUCCESS), Redirect::to("/login")))
        }
        // Lost a race with a concurrent signup for the same address
        Err(e) if is_unique_violation(&e) => {
            warn!("[SIGNUP] Email already registered: {}", email);
            Ok((push_flash(jar, USER_EXISTS), Redirect::to("/login")))
        }
        Err(e) => {
            error!("[SIGNUP] Database error creating user: {}", e);
            Err(AppError::from(e))
        }
    }
}

/// `GET /logout`
pub async fn logout(jar: CookieJar) -> (CookieJar, Redirect) {
    info!("[LOGOUT] Session cleared");
    (end_session(jar), Redirect::to("/"))
}

/// `GET /check_login_status`
pub async fn check_login_status(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Json<LoginStatus> {
    let logged_in = resolve_user(&state, &jar).await.is_some();
    Json(LoginStatus { logged_in })
}
