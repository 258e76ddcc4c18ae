//! Runtime adapters for spawning and supervising worker loops.

pub mod tokio_spawner;
pub mod worker_set;

pub use tokio_spawner::TokioSpawner;
pub use worker_set::WorkerSet;
