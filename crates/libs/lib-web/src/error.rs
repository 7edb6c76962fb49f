//! Mapping of [`lib_auth::Error`] onto [`AppError`].

use lib_core::AppError;

pub fn from_auth(err: lib_auth::Error) -> AppError {
    use lib_auth::Error;

    match err {
        Error::WeakPassword(msg) => AppError::InvalidInput(msg),
        Error::TokenDecode(msg) => AppError::Unauthorized(msg),
        Error::OAuthExchange(msg) | Error::Profile(msg) => AppError::Upstream(msg),
        Error::OAuthConfig(msg) => AppError::Config(msg),
        other @ (Error::Hash(_) | Error::HashFormat(_) | Error::TokenEncode(_)) => {
            AppError::Internal(other.to_string())
        }
    }
}
