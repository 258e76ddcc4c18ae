//! Build a keyed queue and its worker set from configuration.

use std::fmt::Debug;
use std::hash::Hash;

use anyhow::anyhow;

use crate::config::QueueConfig;
use crate::core::{AppResult, Context, KeyedQueue};
use crate::runtime::{TokioSpawner, WorkerSet};

/// A queue together with the worker loops draining it.
#[derive(Debug)]
pub struct QueueRuntime<K> {
    /// The queue producers call `put` on.
    pub queue: KeyedQueue<K>,
    /// Worker loops started for the queue.
    pub workers: WorkerSet,
    /// Configuration the runtime was built from.
    pub config: QueueConfig,
}

impl<K> QueueRuntime<K> {
    /// Stop the workers, waiting up to the configured shutdown timeout.
    ///
    /// Returns how many loops exited on their own.
    pub async fn shutdown(&self) -> usize {
        self.workers.shutdown(self.config.shutdown_timeout()).await
    }
}

/// Validate `cfg`, build the queue, and start its workers on `spawner`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid.
pub fn build_queue<K>(
    cfg: &QueueConfig,
    parent: &Context,
    spawner: &TokioSpawner,
) -> AppResult<QueueRuntime<K>>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    cfg.validate()
        .map_err(|e| anyhow!("keyed queue config invalid: {e}"))?;

    let queue = KeyedQueue::try_new(cfg.size_limit)?;
    let workers = WorkerSet::start(&queue, cfg.worker_count, parent, spawner);

    Ok(QueueRuntime {
        queue,
        workers,
        config: cfg.clone(),
    })
}
