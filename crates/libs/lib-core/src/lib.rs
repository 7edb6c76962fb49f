//! # Core Library
//!
//! Configuration, error type, user storage and wire DTOs shared by the web layer.

pub mod config;
pub mod dto;
pub mod error;
pub mod model;

// Re-export commonly used types
pub use config::{AuthMode, Config, GoogleConfig, LlmConfig};
pub use error::{AppError, Result};
pub use model::cache::{GoogleUser, GoogleUserCache};
pub use model::store::{create_pool, run_migrations, DbPool};
