//! Error types for the risk engine

use thiserror::Error;

/// Risk engine error
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unknown action type in a request
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    /// Signal store failure
    #[error("Store error: {0}")]
    Store(#[from] signal_store::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
