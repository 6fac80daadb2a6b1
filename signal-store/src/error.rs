//! Error types for the signal store

use thiserror::Error;

/// Signal store error
#[derive(Debug, Error)]
pub enum Error {
    /// Store backend unavailable or query failed
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
