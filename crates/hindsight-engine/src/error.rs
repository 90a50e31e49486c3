//! Engine error types.

use thiserror::Error;

/// A specialized Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid construction arguments
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not allowed in the context's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Date or calendar error
    #[error(transparent)]
    Core(#[from] hindsight_core::CoreError),

    /// Pricing service error
    #[error("pricing service error: {0}")]
    Service(#[from] hindsight_traits::TraitError),

    /// A request exceeded its execution budget
    #[error("timed out after {0} seconds")]
    Timeout(u64),

    /// A deferred result was abandoned before completion
    #[error("deferred result was cancelled")]
    Cancelled,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        EngineError::InvalidArgument(reason.into())
    }

    /// Creates an invalid state error.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        EngineError::InvalidState(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hindsight_core::CoreError;
    use hindsight_traits::TraitError;

    #[test]
    fn test_wrapped_errors_display() {
        let core: EngineError = CoreError::unknown_calendar("XXX").into();
        assert_eq!(core.to_string(), "Unknown holiday calendar: XXX");

        let service: EngineError = TraitError::RateLimited.into();
        assert_eq!(service.to_string(), "pricing service error: rate limited");
    }

    #[test]
    fn test_state_error_display() {
        let err = EngineError::invalid_state("cannot resolve in place under a historical pricing context");
        assert!(err.to_string().contains("cannot resolve in place"));
    }
}
