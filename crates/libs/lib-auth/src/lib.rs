//! # Authentication Library
//!
//! Password hashing, signed session tokens and the Google OAuth2 client.

pub mod error;
pub mod google;
pub mod pwd;
pub mod token;

// Re-export commonly used types
pub use error::{Error, Result};
pub use google::{GoogleOAuth, GoogleProfile, GoogleSettings};
pub use pwd::{hash_password, verify_password, MIN_PASSWORD_LEN};
pub use token::{decode_session, encode_session, SessionClaims};
