//! LexGuard error types

use thiserror::Error;

/// LexGuard error type
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reasoning-model capability error (transport, auth, malformed response)
    #[error("Model error: {0}")]
    Model(String),

    /// Audit store error
    #[error("Audit error: {0}")]
    Audit(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for LexGuard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Serialize any `Serialize` value to `serde_json::Value` without panicking.
///
/// Falls back to a JSON error object if serialization fails (e.g. non-finite
/// floats in a confidence field).
pub fn to_json<T: serde::Serialize>(value: T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        serde_json::json!({
            "error": {
                "code": "SERIALIZATION_ERROR",
                "message": e.to_string()
            }
        })
    })
}
