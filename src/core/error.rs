//! Error types for queue operations.

use thiserror::Error;

/// Reason a [`Context`](crate::core::Context) ended.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    /// The context (or one of its parents) was cancelled.
    #[error("context canceled")]
    Cancelled,
    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors produced by [`KeyedQueue`](crate::core::KeyedQueue) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The caller's context ended while waiting for the queue state.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// The queue was constructed with a zero size limit.
    #[error("size limit must be greater than 0")]
    InvalidLimit,
    /// The internal state slots were torn down.
    #[error("queue state slots disconnected")]
    Disconnected,
}

impl QueueError {
    /// True when the error is a context cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Context(ContextError::Cancelled))
    }

    /// True when the error is a context deadline expiry.
    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::Context(ContextError::DeadlineExceeded))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
