//! Error types for the fraud check service

use thiserror::Error;

/// Fraud service error
#[derive(Debug, Error)]
pub enum Error {
    /// Request failed validation before the pipeline ran
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Unknown action type; rejected before any analyzer runs
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),

    /// Invalid pipeline configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Signal store failure outside the degraded-analysis path
    #[error("Store error: {0}")]
    Store(#[from] signal_store::Error),
}

impl From<risk_engine::Error> for Error {
    fn from(err: risk_engine::Error) -> Self {
        match err {
            risk_engine::Error::UnknownActionType(s) => Error::UnknownActionType(s),
            risk_engine::Error::InvalidConfig(s) => Error::InvalidConfig(s),
            risk_engine::Error::Store(e) => Error::Store(e),
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
