//! # Web Library
//!
//! HTTP handlers, middleware, sessions, templates and the LLM client.
//!
//! [`create_router`] builds the application for an [`AppState`];
//! [`start_server`] loads configuration from the environment, builds the
//! state and serves it.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod server;
pub mod services;
pub mod session;
pub mod templates;

#[cfg(test)]
mod test_support;

pub use server::{create_router, start_server, AppState, AuthBackend, ServerConfig};
