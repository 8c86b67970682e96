//! Admission error types.

use thiserror::Error;

/// Result type alias for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors returned by [`AdmissionQueue`](crate::AdmissionQueue).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// The queue held `capacity` tokens at the instant of the attempt.
    #[error("queue full: capacity {capacity} reached")]
    Full { capacity: usize },
}
