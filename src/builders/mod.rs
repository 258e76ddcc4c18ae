//! Builders to construct a running queue from configuration.

pub mod queue_builder;

pub use queue_builder::{build_queue, QueueRuntime};
