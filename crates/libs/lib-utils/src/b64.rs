//! # Base64 Encoding/Decoding
//!
//! URL-safe base64 helpers. Cookie values may not carry spaces, commas or
//! quotes, so structured payloads (flash messages) go through
//! [`b64u_encode_json`] before they are stored in a cookie.

use base64::{engine::general_purpose, Engine as _};
use serde::{de::DeserializeOwned, Serialize};

/// Encode bytes to base64 URL-safe string (no padding).
pub fn b64u_encode(content: impl AsRef<[u8]>) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(content)
}

/// Decode base64 URL-safe string to bytes.
pub fn b64u_decode(b64u: &str) -> Result<Vec<u8>, Error> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(b64u)
        .map_err(|_| Error::FailToB64uDecode)
}

/// Serialize a value to JSON and encode it as base64 URL-safe text.
pub fn b64u_encode_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value).map_err(|e| Error::Json(e.to_string()))?;
    Ok(b64u_encode(json))
}

/// Decode base64 URL-safe text and deserialize the JSON payload inside it.
pub fn b64u_decode_json<T: DeserializeOwned>(b64u: &str) -> Result<T, Error> {
    let bytes = b64u_decode(b64u)?;
    serde_json::from_slice(&bytes).map_err(|e| Error::Json(e.to_string()))
}

// region:    --- Error
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("value is not valid base64url")]
    FailToB64uDecode,

    #[error("invalid JSON payload: {0}")]
    Json(String),
}
// endregion: --- Error
