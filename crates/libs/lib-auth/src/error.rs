//! # Authentication Errors

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Password rejected before hashing.
    #[error("{0}")]
    WeakPassword(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    /// Stored hash is not a valid PHC string.
    #[error("Failed to parse hash: {0}")]
    HashFormat(String),

    #[error("Failed to encode session token: {0}")]
    TokenEncode(String),

    /// Expired, tampered or otherwise invalid session token.
    #[error("Failed to decode session token: {0}")]
    TokenDecode(String),

    #[error("Invalid OAuth configuration: {0}")]
    OAuthConfig(String),

    #[error("OAuth code exchange failed: {0}")]
    OAuthExchange(String),

    #[error("Failed to fetch Google profile: {0}")]
    Profile(String),
}
