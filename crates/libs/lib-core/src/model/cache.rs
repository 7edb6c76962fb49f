//! # Google User Cache
//!
//! Users who signed in with Google, keyed by email. Nothing is persisted:
//! a restart empties the cache and every session has to log in again.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A Google-authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoogleUser {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Shared, cloneable handle to the in-memory user table.
#[derive(Debug, Clone, Default)]
pub struct GoogleUserCache {
    users: Arc<RwLock<HashMap<String, GoogleUser>>>,
}

impl GoogleUserCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a user. Returns `true` when the email was new.
    pub async fn upsert(&self, user: GoogleUser) -> bool {
        self.users
            .write()
            .await
            .insert(user.email.clone(), user)
            .is_none()
    }

    pub async fn get(&self, email: &str) -> Option<GoogleUser> {
        self.users.read().await.get(email).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}
