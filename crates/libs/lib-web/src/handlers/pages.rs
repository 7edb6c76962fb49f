//! Landing page and chat page.

use crate::middleware::{resolve_user, CurrentUser};
use crate::server::AppState;
use crate::session::take_flash;
use axum::{
    extract::{Query, State},
    response::Html,
    Extension,
};
use axum_extra::extract::cookie::CookieJar;
use lib_core::dto::ChatbotQuery;
use lib_core::Result;
use minijinja::context;

/// `GET /`
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let user = resolve_user(&state, &jar).await;
    let (jar, flashes) = take_flash(jar);

    let page = state.templates.render(
        "index.html",
        context! {
            user,
            flashes,
            auth_mode => state.auth_mode().as_str(),
        },
    )?;

    Ok((jar, page))
}

/// `GET /chatbot?prompt=...`, behind [`crate::middleware::require_login`].
pub async fn chatbot(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<ChatbotQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Html<String>)> {
    let (jar, flashes) = take_flash(jar);

    let page = state.templates.render(
        "chatbot.html",
        context! {
            user,
            flashes,
            prompt => query.prompt,
            auth_mode => state.auth_mode().as_str(),
        },
    )?;

    Ok((jar, page))
}
