//! Shared fixtures for handler and middleware tests.

use crate::server::{AppState, AuthBackend};
use crate::services::{ChatCompletion, CompletionRequest, LlmError};
use crate::session::SESSION_COOKIE;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lib_auth::{encode_session, GoogleOAuth, GoogleSettings};
use lib_core::{
    create_pool, run_migrations, AuthMode, Config, DbPool, GoogleConfig, GoogleUserCache, LlmConfig,
};
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &str = "test-secret-key-must-be-at-least-32-characters-long!";

pub fn test_config(auth_mode: AuthMode) -> Config {
    Config {
        auth_mode,
        database_url: "sqlite::memory:".to_string(),
        secret_key: TEST_SECRET.to_string(),
        session_expiration_hours: 24,
        llm: LlmConfig {
            api_url: "http://127.0.0.1:1/unused".to_string(),
            api_key: "gsk_test".to_string(),
            model: "llama3-8b-8192".to_string(),
        },
        google: match auth_mode {
            AuthMode::Google => Some(GoogleConfig {
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                redirect_url: "http://127.0.0.1:5000/google_login/callback".to_string(),
            }),
            AuthMode::Local => None,
        },
    }
}

/// In-memory database with the real migrations applied.
pub async fn setup_test_db() -> DbPool {
    let pool = create_pool("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    run_migrations(&pool, concat!(env!("CARGO_MANIFEST_DIR"), "/../../../migrations"))
        .await
        .expect("Failed to run migrations");

    pool
}

/// Completion provider with a canned answer that records what it was sent.
pub struct FakeLlm {
    reply: Result<String, String>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlm {
    pub fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatCompletion for FakeLlm {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone().map_err(LlmError::Provider)
    }
}

pub async fn local_state(llm: Arc<FakeLlm>) -> AppState {
    AppState::new(
        test_config(AuthMode::Local),
        llm,
        AuthBackend::Local(setup_test_db().await),
    )
    .expect("state")
}

/// Google-mode state against Google's real endpoints. Nothing in the tests
/// using it reaches the network.
pub fn google_state(llm: Arc<FakeLlm>) -> AppState {
    google_state_with(
        llm,
        GoogleSettings::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            "http://127.0.0.1:5000/google_login/callback".to_string(),
        ),
    )
}

pub fn google_state_with(llm: Arc<FakeLlm>, settings: GoogleSettings) -> AppState {
    let oauth = GoogleOAuth::new(settings).expect("oauth client");
    AppState::new(
        test_config(AuthMode::Google),
        llm,
        AuthBackend::Google {
            oauth: Arc::new(oauth),
            users: GoogleUserCache::new(),
        },
    )
    .expect("state")
}

pub fn session_jar(state: &AppState, subject: &str, email: &str) -> CookieJar {
    let token = encode_session(subject, email, &state.config.secret_key, 1).expect("token");
    CookieJar::new().add(Cookie::new(SESSION_COOKIE, token))
}

/// `Cookie` request header value carrying a session for `subject`.
pub fn session_cookie(state: &AppState, subject: &str, email: &str) -> String {
    let token = encode_session(subject, email, &state.config.secret_key, 1).expect("token");
    format!("{SESSION_COOKIE}={token}")
}

/// `name=value` pairs of every non-empty `Set-Cookie` header, joined for a
/// follow-up request's `Cookie` header.
pub fn cookies_from(response: &Response<Body>) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Whether the response sets a non-empty cookie called `name`.
pub fn sets_cookie(response: &Response<Body>, name: &str) -> bool {
    cookies_from(response)
        .split("; ")
        .any(|pair| pair.starts_with(&format!("{name}=")))
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}
