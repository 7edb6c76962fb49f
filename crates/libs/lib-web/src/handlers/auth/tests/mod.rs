//! # Auth Handler Tests
//!
//! Sign-up, login and session endpoints driven through the full router.


use super::*;
use crate::server::create_router;
use crate::test_support::{body_string, cookies_from, local_state, location, sets_cookie, FakeLlm};
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use tower::ServiceExt;

/// Local-mode router with an in-memory database.
pub async fn test_app() -> (AppState, Router) {
    let state = local_state(FakeLlm::replying("unused")).await;
    (state.clone(), create_router(state))
}

/// Store a user directly, bypassing the sign-up form.
pub async fn create_user(state: &AppState, email: &str, password: &str) -> i64 {
    let password_hash = hash_password(password).expect("Password hashing should succeed in test");
    UserRepository::create(
        state.pool().unwrap(),
        UserForCreate::new(email.to_string(), password_hash),
    )
    .await
    .expect("User creation should succeed in test")
    .id
}

pub fn form_request(uri: &str, email: &str, password: &str) -> Request<Body> {
    let body = format!(
        "email={}&password={}",
        urlencoding::encode(email),
        urlencoding::encode(password)
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

pub fn get_with_cookies(uri: &str, cookies: &str) -> Request<Body> {
    Request::get(uri)
        .header(header::COOKIE, cookies)
        .body(Body::empty())
        .unwrap()
}

/// Follow a redirect that queued a flash message and return the rendered page.
pub async fn follow(app: &Router, response: &Response<Body>) -> String {
    let next = app
        .clone()
        .oneshot(get_with_cookies(location(response), &cookies_from(response)))
        .await
        .unwrap();
    body_string(next).await
}
