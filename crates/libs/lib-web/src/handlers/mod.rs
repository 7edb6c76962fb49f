//! # HTTP Request Handlers
//!
//! Axum handlers organized by feature.
//!
//! - **[`pages`]**: `GET /`, `GET /chatbot`
//! - **[`auth`]**: email/password accounts (`/login`, `/signup`) and the
//!   session endpoints `/logout` and `/check_login_status`
//! - **[`google`]**: Google login (`/login`, `/google_login`,
//!   `/google_login/callback`)
//! - **[`chat`]**: `POST /send_message`
//!
//! Page handlers return `Result<(CookieJar, Html<String>), AppError>`; the
//! jar carries flash-cookie removal back to the browser. Form handlers
//! answer with a 303 redirect.

pub mod auth;
pub mod chat;
pub mod google;
pub mod pages;
