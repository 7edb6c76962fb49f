//! # Data Transfer Objects (DTOs)
//!
//! Form bodies, query strings and JSON payloads exchanged with the browser.

pub mod auth;
pub mod chat;

pub use auth::*;
pub use chat::*;
