//! Configuration models for the queue and its worker set.

pub mod queue;

pub use queue::QueueConfig;
