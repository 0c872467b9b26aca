//! Error types for caselib.

use thiserror::Error;

/// Result type alias using caselib's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for caselib operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Classifier call failed (transport, timeout, malformed response).
    ///
    /// Per-image classification failures are recoverable: the enrichment
    /// stage maps them to the "unknown" sentinel instead of propagating.
    #[error("Classification error: {0}")]
    Classification(String),

    /// Persistent store load/save failed. Fatal to the whole batch.
    #[error("Store error: {0}")]
    Store(String),

    /// The loaded store violates a structural invariant (duplicate case for
    /// an (entity, difficulty) pair, malformed snapshot). Fatal; never
    /// silently resolved.
    #[error("Store inconsistency: {0}")]
    StoreInconsistency(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
