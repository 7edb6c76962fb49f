//! # LLM Completion
//!
//! The chat endpoint talks to the inference provider through the
//! [`ChatCompletion`] trait. [`GroqClient`] is the production implementation;
//! tests plug in a fake.
//!
//! Requests always ask for a streamed response; the client concatenates the
//! streamed content chunks and returns the full text.

pub mod groq;

pub use groq::GroqClient;

use async_trait::async_trait;
use thiserror::Error;

/// Sampling defaults used by the chat page.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TOP_P: f64 = 1.0;

#[derive(Debug, Error)]
pub enum LlmError {
    /// The request could not be sent or was refused by the provider.
    #[error("provider error: {0}")]
    Provider(String),

    /// The response stream broke off with an error.
    #[error("stream error: {0}")]
    Stream(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One chat completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
}

impl CompletionRequest {
    /// Single-turn request: one system prompt, one user message.
    pub fn single_turn(model: &str, system_prompt: &str, user_message: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system_prompt), ChatMessage::user(user_message)],
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_p: DEFAULT_TOP_P,
        }
    }
}

/// A provider that turns a completion request into generated text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}
