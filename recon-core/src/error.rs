//! Error types for the store layer

use thiserror::Error;

/// Result type for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Store errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (backend-specific)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Settlement identifier already persisted
    #[error("Duplicate settlement record: {0}")]
    DuplicateSettlement(String),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Storage(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Storage(msg.to_string())
    }
}
