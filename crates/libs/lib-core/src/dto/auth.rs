//! # Authentication DTOs
//!
//! ## Endpoints Using These DTOs
//!
//! - `POST /login` - [`LoginForm`] (form body) + [`LoginQuery`] (query string)
//! - `POST /signup` - [`SignupForm`] (form body)
//! - `GET /google_login/callback` - [`OAuthCallbackQuery`]
//! - `GET /check_login_status` - [`LoginStatus`]
//!
//! Form fields are URL-encoded (`application/x-www-form-urlencoded`), the
//! way the HTML forms post them. Missing fields deserialize as empty
//! strings so validation can report them instead of the extractor
//! rejecting the request.

use serde::{Deserialize, Serialize};

/// Login form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Sign-up form.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Optional continuation carried by `/login?next=chatbot&prompt=...`.
///
/// Set by the landing page when a logged-out visitor submits a prompt.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoginQuery {
    pub next: Option<String>,
    pub prompt: Option<String>,
}

impl LoginQuery {
    /// Prompt to carry into the chat page, if the continuation asks for it.
    pub fn chatbot_prompt(&self) -> Option<&str> {
        match (self.next.as_deref(), self.prompt.as_deref()) {
            (Some("chatbot"), Some(prompt)) if !prompt.is_empty() => Some(prompt),
            _ => None,
        }
    }
}

/// Query string Google appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set instead of `code` when the user denies consent.
    pub error: Option<String>,
}

/// Response of `GET /check_login_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginStatus {
    pub logged_in: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chatbot_prompt_requires_next_and_prompt() {
        let query = LoginQuery {
            next: Some("chatbot".into()),
            prompt: Some("tell me a joke".into()),
        };
        assert_eq!(query.chatbot_prompt(), Some("tell me a joke"));

        let no_next = LoginQuery {
            next: None,
            prompt: Some("tell me a joke".into()),
        };
        assert_eq!(no_next.chatbot_prompt(), None);

        let other_next = LoginQuery {
            next: Some("https://evil.example".into()),
            prompt: Some("x".into()),
        };
        assert_eq!(other_next.chatbot_prompt(), None);

        let empty_prompt = LoginQuery {
            next: Some("chatbot".into()),
            prompt: Some(String::new()),
        };
        assert_eq!(empty_prompt.chatbot_prompt(), None);
    }
}
