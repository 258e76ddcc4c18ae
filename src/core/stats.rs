//! Queue statistics: lock-free counters plus token-consistent snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters about queue throughput, readable without taking the state token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Configured capacity.
    pub size_limit: usize,

    /// Units accepted by `put`.
    pub submitted: u64,

    /// Units handed to a worker.
    pub started: u64,

    /// Units that ran to completion.
    pub completed: u64,

    /// Units that panicked.
    pub panicked: u64,

    /// Units executing right now.
    pub active: u64,
}

/// Consistent view of the shared state, taken while holding the token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSnapshot {
    /// Pending (not yet started) units.
    pub pending: usize,

    /// Configured capacity.
    pub size_limit: usize,

    /// Known keys with nothing pending.
    pub empty_keys: usize,

    /// Keys with pending work and no worker.
    pub unlocked_keys: usize,

    /// Keys with a unit currently executing.
    pub locked_keys: usize,
}

impl QueueSnapshot {
    /// Keys the queue has ever seen.
    #[must_use]
    pub const fn known_keys(&self) -> usize {
        self.empty_keys + self.unlocked_keys + self.locked_keys
    }
}

#[derive(Debug, Default)]
pub(crate) struct QueueCounters {
    pub submitted: AtomicU64,
    pub started: AtomicU64,
    pub completed: AtomicU64,
    pub panicked: AtomicU64,
    pub active: AtomicU64,
}

impl QueueCounters {
    /// Count a unit as started and active until the guard drops.
    pub fn begin_unit(&self) -> ActiveUnit<'_> {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
        ActiveUnit {
            active: &self.active,
        }
    }

    pub fn snapshot(&self, size_limit: usize) -> QueueStats {
        QueueStats {
            size_limit,
            submitted: self.submitted.load(Ordering::Relaxed),
            started: self.started.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
        }
    }
}

/// Holds one slot of the `active` counter.
pub(crate) struct ActiveUnit<'a> {
    active: &'a AtomicU64,
}

impl Drop for ActiveUnit<'_> {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::Relaxed);
    }
}
