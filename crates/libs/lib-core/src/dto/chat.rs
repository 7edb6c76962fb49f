//! # Chat DTOs
//!
//! `POST /send_message` takes [`SendMessageRequest`] and always answers with
//! [`SendMessageResponse`], including for validation and provider failures.
//!
//! ```text
//! POST /send_message
//! Content-Type: application/json
//!
//! {"message": "Hello"}
//! ```
//!
//! Response:
//! ```text
//! {"bot_response": "Hi! How can I help?<br>Ask me anything."}
//! ```

use serde::{Deserialize, Serialize};

/// Query string of `GET /chatbot`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatbotQuery {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SendMessageRequest {
    /// Missing and `null` are treated like empty.
    #[serde(default)]
    pub message: Option<String>,
}

impl SendMessageRequest {
    pub fn text(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SendMessageResponse {
    /// HTML fragment: newlines are already converted to `<br>`.
    pub bot_response: String,
}

impl SendMessageResponse {
    pub fn new(bot_response: impl Into<String>) -> Self {
        Self {
            bot_response: bot_response.into(),
        }
    }
}
