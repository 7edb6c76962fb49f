//! # Utilities Library
//!
//! Shared helpers for cookie payload encoding and form input validation.

pub mod b64;
pub mod validation;

// Re-export commonly used functions
pub use b64::{b64u_decode, b64u_decode_json, b64u_encode, b64u_encode_json};
pub use validation::{normalize_email, validate_email, validate_not_empty};
