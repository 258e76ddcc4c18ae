//! A fixed set of worker loops draining one [`KeyedQueue`].
//!
//! The bot process starts one `WorkerSet` at boot. All loops share a child of
//! the caller's context, so [`WorkerSet::shutdown`] can stop them without
//! touching the caller's scope, and cancelling the caller's scope stops them
//! too.

use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{Context, KeyedQueue, QueueError};

use super::TokioSpawner;

/// Handles for the running worker loops of a queue.
#[derive(Debug)]
pub struct WorkerSet {
    ctx: Context,
    workers: Mutex<Vec<JoinHandle<Result<(), QueueError>>>>,
    worker_count: usize,
}

impl WorkerSet {
    /// Spawn `worker_count` loops draining `queue`.
    pub fn start<K>(
        queue: &KeyedQueue<K>,
        worker_count: usize,
        parent: &Context,
        spawner: &TokioSpawner,
    ) -> Self
    where
        K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    {
        let ctx = parent.child();
        let workers = (0..worker_count)
            .map(|worker_id| {
                let queue = queue.clone();
                let ctx = ctx.clone();
                spawner.spawn(async move {
                    debug!(worker_id, "worker loop started");
                    let result = queue.worker(&ctx).await;
                    debug!(worker_id, "worker loop exited");
                    result
                })
            })
            .collect();

        info!(
            worker_count,
            size_limit = queue.limit(),
            "keyed queue workers started"
        );

        Self {
            ctx,
            workers: Mutex::new(workers),
            worker_count,
        }
    }

    /// Number of loops started.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.worker_count
    }

    /// True when no loops were started.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.worker_count == 0
    }

    /// Context shared by all loops.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.ctx
    }

    /// Cancel all loops and wait up to `timeout` for each to exit.
    ///
    /// Units already executing finish first. Loops that miss the timeout are
    /// aborted; the unit they were running is dropped and its key is released
    /// in the background, so queued units for that key still run on any other
    /// worker. Returns how many loops exited on their own.
    pub async fn shutdown(&self, timeout: Duration) -> usize {
        self.ctx.cancel();

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        let worker_count = workers.len();
        let mut joined = 0;

        for (worker_id, mut worker) in workers.into_iter().enumerate() {
            match tokio::time::timeout(timeout, &mut worker).await {
                Ok(Ok(_)) => {
                    joined += 1;
                    debug!(worker_id, "worker joined");
                }
                Ok(Err(e)) => {
                    warn!(worker_id, error = %e, "worker task failed");
                }
                Err(_) => {
                    warn!(worker_id, "worker did not exit within timeout - aborting");
                    worker.abort();
                }
            }
        }

        info!(worker_count, joined, "keyed queue workers shut down");
        joined
    }
}

impl Drop for WorkerSet {
    fn drop(&mut self) {
        // Stop the loops but do not wait for them.
        self.ctx.cancel();
    }
}
