//! Core queue abstractions: keyed queue, shared state, cancellation scopes.

pub mod attacher;
pub mod context;
pub mod error;
pub mod fair_index;
pub mod keyed_queue;
mod state;
pub mod stats;

pub use attacher::{AttachGuard, Attacher};
pub use context::Context;
pub use error::{AppResult, ContextError, QueueError};
pub use fair_index::FairIndex;
pub use keyed_queue::KeyedQueue;
pub use state::WorkItem;
pub use stats::{QueueSnapshot, QueueStats};
