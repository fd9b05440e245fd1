//! Storage error types

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The storage engine is not present in this environment
    #[error("storage engine not available: {0}")]
    NotAvailable(String),

    /// Opening (or upgrading) the database failed
    #[error("open failed: {0}")]
    Open(String),

    /// A single request against the object store failed
    #[error("request failed: {0}")]
    Request(String),

    /// A transaction failed or was aborted
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Key contains characters at or above the range sentinel
    #[error("invalid key {0:?}: characters must sort below '~'")]
    InvalidKey(String),

    /// The backend does not support this operation
    #[error("{0} is not supported by this store")]
    Unsupported(String),

    /// Invalid store configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
