//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while building or validating a `ServiceConfig`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("queue capacity must be greater than zero")]
    InvalidCapacity,

    #[error("invalid duration '{0}': expected a value like \"100ms\" or \"1s\"")]
    InvalidDuration(String),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("http burst must be greater than zero")]
    InvalidBurst,

    #[error("memory chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("listen and metrics addresses must differ (both {0})")]
    AddressConflict(String),
}
