//! Key-partitioned work queue with per-key serialization.
//!
//! `KeyedQueue` accepts units of work tagged with a key. Units sharing a key
//! never run concurrently and run in submission order; units with different
//! keys run in parallel across however many [`KeyedQueue::worker`] loops are
//! polling the queue.
//!
//! # Design
//!
//! - **Token passing**: the shared state is a single value that lives in one of
//!   four bounded(1) channels, one per (has ready work, at capacity) pair.
//!   Receiving it grants exclusive access; the holder redeposits it into the
//!   channel matching the new predicates. Producers only listen on the
//!   "not at capacity" channels and workers only on the "has work" channels,
//!   so each waiter wakes exactly when its predicate holds. No polling.
//! - **Admission control**: `put` blocks while `size_limit` units are pending.
//! - **Fairness**: keys are served round-robin in the order they became ready.
//! - **Failure isolation**: a panicking unit is logged and contained; its key
//!   is released as usual.
//!
//! # Example
//!
//! ```rust,ignore
//! use keyed_work_queue::core::{Context, KeyedQueue};
//!
//! let queue = KeyedQueue::<String>::new(1024);
//! let ctx = Context::new();
//!
//! for _ in 0..4 {
//!     let (queue, ctx) = (queue.clone(), ctx.clone());
//!     tokio::spawn(async move { queue.worker(&ctx).await });
//! }
//!
//! queue
//!     .put(&ctx, "#general".to_string(), |_attach| async move {
//!         // handle one chat event for #general
//!     })
//!     .await?;
//! ```

use std::any::Any;
use std::fmt;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use flume::{Receiver, Sender};
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use super::state::{SharedState, Slot};
use super::stats::QueueCounters;
use super::{Attacher, Context, QueueError, QueueSnapshot, QueueStats, WorkItem};

/// One holding slot for the state token.
struct SlotChannel<K> {
    tx: Sender<SharedState<K>>,
    rx: Receiver<SharedState<K>>,
}

struct Inner<K> {
    slots: [SlotChannel<K>; 4],
    size_limit: usize,
    counters: QueueCounters,
}

/// Bounded, fair, key-partitioned work queue.
///
/// Cloning is cheap; clones share the same queue.
pub struct KeyedQueue<K> {
    inner: Arc<Inner<K>>,
}

impl<K> Clone for KeyedQueue<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K> fmt::Debug for KeyedQueue<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedQueue")
            .field("size_limit", &self.inner.size_limit)
            .field("stats", &self.inner.counters.snapshot(self.inner.size_limit))
            .finish()
    }
}

impl<K> KeyedQueue<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// Create an empty queue holding at most `limit` pending units.
    ///
    /// # Panics
    ///
    /// Panics if `limit` is zero. Use [`KeyedQueue::try_new`] to get an error
    /// instead.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        match Self::try_new(limit) {
            Ok(queue) => queue,
            Err(e) => panic!("invalid keyed queue limit {limit}: {e}"),
        }
    }

    /// Create an empty queue holding at most `limit` pending units.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::InvalidLimit` if `limit` is zero.
    pub fn try_new(limit: usize) -> Result<Self, QueueError> {
        if limit == 0 {
            return Err(QueueError::InvalidLimit);
        }

        let slots = std::array::from_fn(|_| {
            let (tx, rx) = flume::bounded(1);
            SlotChannel { tx, rx }
        });
        let queue = Self {
            inner: Arc::new(Inner {
                slots,
                size_limit: limit,
                counters: QueueCounters::default(),
            }),
        };
        queue.redeposit(SharedState::new(limit));

        info!(size_limit = limit, "keyed queue initialized");
        Ok(queue)
    }

    /// Maximum number of pending units.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.inner.size_limit
    }

    /// Throughput counters. Does not take the state token.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        self.inner.counters.snapshot(self.inner.size_limit)
    }

    /// Queue `unit` under `key`, waiting while the queue is at capacity.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Context` if `ctx` ends before capacity frees up.
    /// The unit is not queued in that case.
    pub async fn put<F, Fut>(&self, ctx: &Context, key: K, unit: F) -> Result<(), QueueError>
    where
        F: FnOnce(Attacher) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let item: WorkItem = Box::new(move |attach: Attacher| unit(attach).boxed());
        self.put_item(ctx, key, item).await
    }

    /// Queue an already boxed [`WorkItem`]. See [`KeyedQueue::put`].
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Context` if `ctx` ends before capacity frees up.
    pub async fn put_item(&self, ctx: &Context, key: K, unit: WorkItem) -> Result<(), QueueError> {
        let mut state = self.acquire(ctx, &Slot::FOR_PUT).await?;
        state.push(key, unit);
        self.redeposit(state);
        self.inner.counters.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Run units until `ctx` ends.
    ///
    /// A unit that is already executing when `ctx` ends runs to completion
    /// and its key is released before the loop returns. If the loop's future
    /// is dropped mid-unit instead (a timeout, a `select!`, an aborted task),
    /// the key is released from a background task.
    ///
    /// # Errors
    ///
    /// Always returns an error: `QueueError::Context` once `ctx` ends, or
    /// `QueueError::Disconnected` if the state slots were torn down.
    pub async fn worker(&self, ctx: &Context) -> Result<(), QueueError> {
        loop {
            let mut state = self.acquire(ctx, &Slot::FOR_WORK).await?;
            let Some((key, unit)) = state.take_ready() else {
                self.redeposit(state);
                continue;
            };
            self.redeposit(state);

            let lock = KeyLock::new(self.clone(), key);
            self.run_unit(lock.key(), unit, Attacher::new(ctx.clone())).await;
            lock.release().await?;
        }
    }

    /// Take the state token and report a consistent view of it.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Context` if `ctx` ends first.
    pub async fn snapshot(&self, ctx: &Context) -> Result<QueueSnapshot, QueueError> {
        let state = self.acquire(ctx, &Slot::ALL).await?;
        let snapshot = QueueSnapshot {
            pending: state.size(),
            size_limit: state.size_limit(),
            empty_keys: state.empty_keys(),
            unlocked_keys: state.unlocked_keys(),
            locked_keys: state.locked_keys(),
        };
        self.redeposit(state);
        Ok(snapshot)
    }

    /// Wait for the token in any of `slots`, or for `ctx` to end.
    async fn acquire(&self, ctx: &Context, slots: &[Slot]) -> Result<SharedState<K>, QueueError> {
        if let Some(reason) = ctx.err() {
            return Err(reason.into());
        }

        let receivers = slots
            .iter()
            .map(|slot| Box::pin(self.inner.slots[slot.index()].rx.recv_async()));

        tokio::select! {
            (received, _, _) = futures::future::select_all(receivers) => {
                received.map_err(|_| QueueError::Disconnected)
            }
            reason = ctx.done() => Err(reason.into()),
        }
    }

    /// Put the token back into the slot matching its predicates.
    fn redeposit(&self, state: SharedState<K>) {
        let slot = state.slot();
        // Only one token exists, so every slot is empty while we hold it.
        if let Err(e) = self.inner.slots[slot.index()].tx.try_send(state) {
            error!(slot = ?slot, error = %e, "failed to redeposit queue state");
        }
    }

    /// Release `key` after its unit ran. Ignores capacity and cancellation so
    /// that a key is never left locked.
    async fn unlock(&self, key: K) -> Result<(), QueueError> {
        let mut state = self.acquire(&Context::background(), &Slot::ALL).await?;
        state.release(key);
        self.redeposit(state);
        Ok(())
    }

    async fn run_unit(&self, key: &K, unit: WorkItem, attacher: Attacher) {
        let counters = &self.inner.counters;
        let active = counters.begin_unit();
        debug!(key = ?key, "executing unit");

        let outcome = AssertUnwindSafe(async move { unit(attacher).await })
            .catch_unwind()
            .await;

        drop(active);
        match outcome {
            Ok(()) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                debug!(key = ?key, "unit completed");
            }
            Err(panic) => {
                counters.panicked.fetch_add(1, Ordering::Relaxed);
                error!(
                    key = ?key,
                    panic = %panic_message(panic.as_ref()),
                    "work unit panicked"
                );
            }
        }
    }
}

/// A key locked by a worker for the duration of one unit.
///
/// Dropping it while still held hands the release to a spawned task.
struct KeyLock<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    queue: KeyedQueue<K>,
    key: K,
    held: bool,
}

impl<K> KeyLock<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    const fn new(queue: KeyedQueue<K>, key: K) -> Self {
        Self {
            queue,
            key,
            held: true,
        }
    }

    const fn key(&self) -> &K {
        &self.key
    }

    async fn release(mut self) -> Result<(), QueueError> {
        let result = self.queue.unlock(self.key.clone()).await;
        self.held = false;
        result
    }
}

impl<K> Drop for KeyLock<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        let queue = self.queue.clone();
        let key = self.key.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(key = ?key, "worker dropped mid-unit, releasing key in background");
                handle.spawn(async move {
                    if let Err(e) = queue.unlock(key.clone()).await {
                        error!(key = ?key, error = %e, "background key release failed");
                    }
                });
            }
            Err(_) => {
                error!(key = ?key, "worker dropped outside a runtime, key stays locked");
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
