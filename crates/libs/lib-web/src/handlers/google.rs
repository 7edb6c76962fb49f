//! # Google Login Handlers
//!
//! Authorization-code flow for `AUTH_MODE=google`.
//!
//! 1. `GET /google_login` stores a random CSRF state, plus any pending chat
//!    prompt, in the `oauth_state` cookie and redirects to Google's consent
//!    page.
//! 2. Google redirects to `GET /google_login/callback?code=...&state=...`.
//!    The state must match the cookie; the code is exchanged for a token,
//!    the profile is fetched and the user is cached. The browser lands on
//!    the chat page, opened on the pending prompt if there was one.
//!
//! Every callback failure ends the same way for the browser: a flash
//! message and a redirect to `/login`. The cause is only logged.

use crate::error::from_auth;
use crate::handlers::auth::{chat_target, with_continuation};
use crate::middleware::resolve_user;
use crate::server::AppState;
use crate::session::{
    issue_session, push_flash, set_oauth_state, take_flash, take_oauth_state, PendingOAuth,
};
use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::CookieJar;
use lib_core::dto::{LoginQuery, OAuthCallbackQuery};
use lib_core::{AppError, GoogleUser, Result};
use lib_utils::normalize_email;
use minijinja::context;
use tracing::{debug, info, instrument, warn};

pub const GOOGLE_LOGIN_FAILED: &str = "Google login failed. Please try again.";

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
            action => with_continuation("/google_login", &query),
            auth_mode => state.auth_mode().as_str(),
        },
    )?;

    Ok((jar, page))
}

/// `GET /google_login`
pub async fn google_login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let (oauth, _) = state.google()?;
    let (url, csrf_state) = oauth.authorize_url();

    let pending = PendingOAuth {
        csrf_state: csrf_state.secret().clone(),
        prompt: query.chatbot_prompt().map(str::to_string),
    };

    debug!("[OAUTH] Redirecting to consent page");
    let jar = set_oauth_state(jar, &pending)?;
    Ok((jar, Redirect::to(url.as_str())))
}

/// `GET /google_login/callback`
#[instrument(skip_all)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let (jar, pending) = take_oauth_state(jar);
    let expected_state = pending.as_ref().map(|p| p.csrf_state.as_str());

    match complete_login(&state, query, expected_state).await {
        Ok(user) => {
            let jar = issue_session(&state, jar, &user.email, &user.email)?;
            info!("[OAUTH] {} logged in with Google", user.email);
            let prompt = pending.as_ref().and_then(|p| p.prompt.as_deref());
            Ok((jar, Redirect::to(&chat_target(prompt))))
        }
        Err(e) => {
            warn!("[OAUTH] Google login failed: {}", e);
            Ok((push_flash(jar, GOOGLE_LOGIN_FAILED), Redirect::to("/login")))
        }
    }
}

async fn complete_login(
    state: &AppState,
    query: OAuthCallbackQuery,
    expected_state: Option<&str>,
) -> Result<GoogleUser> {
    if let Some(error) = query.error {
        return Err(AppError::Unauthorized(format!("consent refused: {error}")));
    }

    match (query.state.as_deref(), expected_state) {
        (Some(got), Some(expected)) if got == expected => {}
        _ => return Err(AppError::Unauthorized("OAuth state mismatch".to_string())),
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::InvalidInput("missing authorization code".to_string()))?;

    let (oauth, users) = state.google()?;
    let access_token = oauth.exchange_code(code).await.map_err(from_auth)?;
    let profile = oauth.fetch_profile(&access_token).await.map_err(from_auth)?;

    let user = GoogleUser {
        email: normalize_email(&profile.email),
        name: profile.name,
        picture: profile.picture,
    };

    if users.upsert(user.clone()).await {
        info!("[OAUTH] First login for {}", user.email);
    }

    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::create_router;
    use crate::test_support::{
        body_string, cookies_from, google_state, google_state_with, location, session_cookie,
        sets_cookie, FakeLlm,
    };
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use lib_auth::GoogleSettings;
    use lib_utils::b64u_encode_json;
    use serde_json::json;
    use tower::ServiceExt;

    /// `Cookie` header for a login started with `csrf_state` and `prompt`.
    fn state_cookie(csrf_state: &str, prompt: Option<&str>) -> String {
        let pending = PendingOAuth {
            csrf_state: csrf_state.to_string(),
            prompt: prompt.map(str::to_string),
        };
        format!("oauth_state={}", b64u_encode_json(&pending).unwrap())
    }

    fn get_with(uri: &str, cookies: &str) -> Request<Body> {
        Request::get(uri)
            .header(header::COOKIE, cookies)
            .body(Body::empty())
            .unwrap()
    }

    /// Local stand-in for Google's token and userinfo endpoints.
    async fn spawn_fake_google(email_verified: bool) -> String {
        let app = Router::new()
            .route(
                "/token",
                post(|| async {
                    Json(json!({
                        "access_token": "fake-access-token",
                        "token_type": "bearer",
                        "expires_in": 3600
                    }))
                }),
            )
            .route(
                "/userinfo",
                get(move || async move {
                    Json(json!({
                        "email": "Gail@Example.com",
                        "email_verified": email_verified,
                        "name": "Gail",
                        "picture": "https://example.com/gail.png"
                    }))
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn settings_for(base: &str) -> GoogleSettings {
        GoogleSettings {
            auth_url: format!("{base}/auth"),
            token_url: format!("{base}/token"),
            userinfo_url: format!("{base}/userinfo"),
            ..GoogleSettings::new(
                "client-id".to_string(),
                "client-secret".to_string(),
                "http://127.0.0.1:5000/google_login/callback".to_string(),
            )
        }
    }

    #[tokio::test]
    async fn test_google_login_redirects_with_state_cookie() {
        let app = create_router(google_state(FakeLlm::replying("unused")));

        let response = app
            .oneshot(Request::get("/google_login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let target = location(&response);
        assert!(target.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(target.contains("client_id=client-id"));
        assert!(target.contains("scope=openid+email+profile"));
        assert!(sets_cookie(&response, "oauth_state"));
    }

    #[tokio::test]
    async fn test_login_page_links_to_google() {
        let app = create_router(google_state(FakeLlm::replying("unused")));

        let response = app
            .clone()
            .oneshot(Request::get("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("Sign in with Google"));

        // Local account routes are not mounted
        let response = app
            .oneshot(Request::get("/signup").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_callback_rejects_mismatched_state() {
        let app = create_router(google_state(FakeLlm::replying("unused")));

        let response = app
            .clone()
            .oneshot(get_with(
                "/google_login/callback?code=abc&state=forged",
                &state_cookie("expected", None),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert!(!sets_cookie(&response, "session"));

        let page = app
            .oneshot(get_with("/login", &cookies_from(&response)))
            .await
            .unwrap();
        assert!(body_string(page).await.contains(GOOGLE_LOGIN_FAILED));
    }

    #[tokio::test]
    async fn test_callback_without_state_cookie_fails() {
        let app = create_router(google_state(FakeLlm::replying("unused")));

        let response = app
            .oneshot(
                Request::get("/google_login/callback?code=abc&state=whatever")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(location(&response), "/login");
        assert!(!sets_cookie(&response, "session"));
    }

    #[tokio::test]
    async fn test_callback_with_consent_error_fails() {
        let app = create_router(google_state(FakeLlm::replying("unused")));

        let response = app
            .oneshot(get_with(
                "/google_login/callback?error=access_denied&state=s1",
                &state_cookie("s1", None),
            ))
            .await
            .unwrap();

        assert_eq!(location(&response), "/login");
        assert!(sets_cookie(&response, "flash"));
    }

    #[tokio::test]
    async fn test_callback_success_caches_user_and_opens_chat() {
        let base = spawn_fake_google(true).await;
        let state = google_state_with(FakeLlm::replying("unused"), settings_for(&base));
        let app = create_router(state.clone());

        let response = app
            .clone()
            .oneshot(get_with("/google_login/callback?code=abc&state=s1", &state_cookie("s1", None)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/chatbot");
        assert!(sets_cookie(&response, "session"));

        let (_, users) = state.google().unwrap();
        let cached = users.get("gail@example.com").await.expect("user cached");
        assert_eq!(cached.name.as_deref(), Some("Gail"));

        let page = app
            .oneshot(get_with("/chatbot", &cookies_from(&response)))
            .await
            .unwrap();
        assert_eq!(page.status(), StatusCode::OK);
        assert!(body_string(page).await.contains("Gail"));
    }

    #[tokio::test]
    async fn test_pending_prompt_survives_google_login() {
        let base = spawn_fake_google(true).await;
        let app = create_router(google_state_with(FakeLlm::replying("unused"), settings_for(&base)));

        // Login page forwards the prompt to the consent redirect
        let response = app
            .clone()
            .oneshot(
                Request::get("/login?next=chatbot&prompt=what%20is%20rust%3F")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let page = body_string(response).await;
        assert!(page.contains("next=chatbot&amp;prompt=what%20is%20rust%3F"));

        let response = app
            .clone()
            .oneshot(
                Request::get("/google_login?next=chatbot&prompt=what%20is%20rust%3F")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(sets_cookie(&response, "oauth_state"));
        let pending_cookie = cookies_from(&response);
        let target = location(&response).to_string();
        let csrf_state = target
            .split(['?', '&'])
            .find_map(|pair| pair.strip_prefix("state="))
            .expect("state parameter")
            .to_string();

        // Callback opens the chat page on that prompt
        let response = app
            .oneshot(get_with(
                &format!("/google_login/callback?code=abc&state={csrf_state}"),
                &pending_cookie,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/chatbot?prompt=what%20is%20rust%3F");
        assert!(sets_cookie(&response, "session"));
    }

    #[tokio::test]
    async fn test_callback_rejects_unverified_email() {
        let base = spawn_fake_google(false).await;
        let state = google_state_with(FakeLlm::replying("unused"), settings_for(&base));
        let app = create_router(state.clone());

        let response = app
            .oneshot(get_with("/google_login/callback?code=abc&state=s1", &state_cookie("s1", None)))
            .await
            .unwrap();

        assert_eq!(location(&response), "/login");
        let (_, users) = state.google().unwrap();
        assert!(users.is_empty().await);
    }

    #[tokio::test]
    async fn test_session_for_uncached_user_is_logged_out() {
        let state = google_state(FakeLlm::replying("unused"));
        let cookie = session_cookie(&state, "gone@example.com", "gone@example.com");
        let app = create_router(state);

        let response = app.oneshot(get_with("/chatbot", &cookie)).await.unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }
}
