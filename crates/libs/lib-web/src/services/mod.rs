//! # Services Layer
//!
//! Integrations with external services, kept behind traits so handlers can
//! be tested without network access.
//!
//! ```text
//! Handlers (HTTP) → Services (external calls) → Provider API
//! ```
//!
//! - [`llm`] - chat completion provider (Groq, OpenAI-compatible streaming API)

pub mod llm;

pub use llm::{ChatCompletion, CompletionRequest, GroqClient, LlmError};
