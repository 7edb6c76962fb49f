//! # Application Configuration
//!
//! Configuration is read from environment variables (after `dotenvy` has
//! loaded `.env`) and validated once on startup so a misconfigured
//! deployment fails before it binds a socket.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `AUTH_MODE` | `local` |
//! | `DATABASE_URL` | `sqlite:data/users.db` |
//! | `SECRET_KEY` | required, at least 32 characters |
//! | `SESSION_EXPIRATION_HOURS` | `24` |
//! | `GROQ_API_KEY` | required |
//! | `LLM_API_URL` | Groq chat completions endpoint |
//! | `LLM_MODEL` | `llama3-8b-8192` |
//! | `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET` | required for `AUTH_MODE=google` |
//! | `GOOGLE_REDIRECT_URL` | `http://127.0.0.1:5000/google_login/callback` |

use crate::error::{AppError, Result};
use std::str::FromStr;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:data/users.db";
pub const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_GOOGLE_REDIRECT_URL: &str = "http://127.0.0.1:5000/google_login/callback";

/// Which account system gates the chat page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthMode {
    /// Email + password accounts stored in SQLite.
    Local,
    /// Google OAuth2 login with an in-memory user cache.
    Google,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
        }
    }
}

impl FromStr for AuthMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "google" => Ok(Self::Google),
            other => Err(AppError::Config(format!(
                "AUTH_MODE must be 'local' or 'google', got '{other}'"
            ))),
        }
    }
}

/// Inference provider settings.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
}

/// Google OAuth client credentials.
#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Application configuration loaded from environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub auth_mode: AuthMode,

    /// SQLite connection URL (local accounts only)
    pub database_url: String,

    /// Secret used to sign session cookies
    ///
    /// **Must be at least 32 characters long.**
    pub secret_key: String,

    /// Session validity period in hours (1-720)
    pub session_expiration_hours: i64,

    pub llm: LlmConfig,

    /// Present when `auth_mode` is [`AuthMode::Google`]
    pub google: Option<GoogleConfig>,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_source(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_source<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| {
            var(name).ok_or_else(|| AppError::Config(format!("{name} must be set in environment")))
        };

        let auth_mode = var("AUTH_MODE")
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or(AuthMode::Local);

        let session_expiration_hours = var("SESSION_EXPIRATION_HOURS")
            .map(|v| {
                v.parse::<i64>().map_err(|e| {
                    AppError::Config(format!("SESSION_EXPIRATION_HOURS must be a valid number: {e}"))
                })
            })
            .transpose()?
            .unwrap_or(24);

        let llm = LlmConfig {
            api_url: var("LLM_API_URL").unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
            api_key: required("GROQ_API_KEY")?,
            model: var("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        };

        let google = match auth_mode {
            AuthMode::Google => Some(GoogleConfig {
                client_id: required("GOOGLE_CLIENT_ID")?,
                client_secret: required("GOOGLE_CLIENT_SECRET")?,
                redirect_url: var("GOOGLE_REDIRECT_URL")
                    .unwrap_or_else(|| DEFAULT_GOOGLE_REDIRECT_URL.to_string()),
            }),
            AuthMode::Local => None,
        };

        Ok(Self {
            auth_mode,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            secret_key: required("SECRET_KEY")?,
            session_expiration_hours,
            llm,
            google,
        })
    }

    /// Validate configuration values against security rules.
    pub fn validate(&self) -> Result<()> {
        if self.secret_key.len() < 32 {
            return Err(AppError::Config(
                "SECRET_KEY must be at least 32 characters long".to_string(),
            ));
        }

        if !(1..=720).contains(&self.session_expiration_hours) {
            return Err(AppError::Config(
                "SESSION_EXPIRATION_HOURS must be between 1 and 720 (30 days)".to_string(),
            ));
        }

        if !self.llm.api_url.starts_with("http://") && !self.llm.api_url.starts_with("https://") {
            return Err(AppError::Config("LLM_API_URL must be an http(s) URL".to_string()));
        }

        if self.auth_mode == AuthMode::Google && self.google.is_none() {
            return Err(AppError::Config(
                "Google credentials are required when AUTH_MODE=google".to_string(),
            ));
        }

        Ok(())
    }
}
