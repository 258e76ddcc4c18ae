//! Tests for error types

use keyed_work_queue::core::{ContextError, QueueError};

#[test]
fn test_context_error_messages() {
    assert_eq!(ContextError::Cancelled.to_string(), "context canceled");
    assert_eq!(
        ContextError::DeadlineExceeded.to_string(),
        "context deadline exceeded"
    );
}

#[test]
fn test_queue_error_is_transparent_over_context() {
    let err: QueueError = ContextError::DeadlineExceeded.into();
    assert_eq!(err.to_string(), "context deadline exceeded");
    assert!(err.is_deadline_exceeded());
    assert!(!err.is_cancelled());

    let err = QueueError::from(ContextError::Cancelled);
    assert!(err.is_cancelled());
}

#[test]
fn test_invalid_limit_error() {
    let err = QueueError::InvalidLimit;
    assert_eq!(err.to_string(), "size limit must be greater than 0");
    assert!(!err.is_cancelled());
    assert!(!err.is_deadline_exceeded());
}

#[test]
fn test_queue_error_into_anyhow() {
    let err: anyhow::Error = QueueError::InvalidLimit.into();
    assert!(err.downcast_ref::<QueueError>().is_some());
}
