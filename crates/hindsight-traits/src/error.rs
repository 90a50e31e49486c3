//! Error types for trait operations.

use thiserror::Error;

/// Common error type for pricing service and cache operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TraitError {
    /// Connection to the pricing service failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Requested resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation timed out
    #[error("timeout")]
    Timeout,

    /// Parse/deserialization error
    #[error("parse error: {0}")]
    ParseError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Invalid input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The service computed the request and reported a failure
    #[error("calculation failed: {0}")]
    CalculationFailed(String),

    /// Rate limited
    #[error("rate limited")]
    RateLimited,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for TraitError {
    fn from(e: std::io::Error) -> Self {
        TraitError::IoError(e.to_string())
    }
}

impl From<hindsight_core::CoreError> for TraitError {
    fn from(e: hindsight_core::CoreError) -> Self {
        TraitError::InvalidInput(e.to_string())
    }
}
