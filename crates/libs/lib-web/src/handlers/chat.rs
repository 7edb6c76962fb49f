//! # Chat Handler
//!
//! `POST /send_message`: forwards one user message to the completion
//! provider and returns the answer as an HTML fragment.
//!
//! The endpoint always answers `200` with a `bot_response`, including for
//! empty input and provider failures, so the chat page can show every
//! outcome the same way.

use crate::services::{ChatCompletion, CompletionRequest};
use axum::{extract::State, Json};
use lib_core::dto::{SendMessageRequest, SendMessageResponse};
use lib_core::Config;
use std::sync::Arc;
use tracing::{debug, error};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const EMPTY_MESSAGE_REPLY: &str = "Please enter a message.";
pub const ERROR_REPLY: &str = "Sorry, there was an error processing your request.";

/// Escape model output for `innerHTML` and turn newlines into `<br>`.
///
/// Only `&`, `<` and `>` are escaped; quotes pass through untouched since
/// the fragment never lands inside an attribute.
pub fn to_html_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("<br>"),
            c => out.push(c),
        }
    }
    out
}

/// `POST /send_message`, behind [`crate::middleware::require_login_api`].
pub async fn send_message(
    State(config): State<Config>,
    State(llm): State<Arc<dyn ChatCompletion>>,
    Json(req): Json<SendMessageRequest>,
) -> Json<SendMessageResponse> {
    let message = req.text();
    if message.trim().is_empty() {
        return Json(SendMessageResponse::new(EMPTY_MESSAGE_REPLY));
    }

    debug!("[CHAT] Forwarding message ({} chars)", message.chars().count());
    let request = CompletionRequest::single_turn(&config.llm.model, SYSTEM_PROMPT, message);

    match llm.complete(&request).await {
        Ok(text) => {
            debug!("[CHAT] Completion received ({} chars)", text.chars().count());
            Json(SendMessageResponse::new(to_html_breaks(&text)))
        }
        Err(e) => {
            error!("[CHAT] Completion failed: {}", e);
            Json(SendMessageResponse::new(ERROR_REPLY))
        }
    }
}
