//! Tests for utility functions

use keyed_work_queue::util::{init_tracing, init_tracing_with};

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    // A subscriber is now in place, so later calls leave it alone.
    assert!(!init_tracing_with("debug"));
    tracing::info!("tracing initialized twice without panicking");
}
