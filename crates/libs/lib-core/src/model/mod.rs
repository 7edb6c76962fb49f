//! # Model Layer
//!
//! - [`store`]: SQLite-backed local accounts
//! - [`cache`]: in-memory Google accounts

pub mod cache;
pub mod store;
