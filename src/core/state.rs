//! Shared queue state partitioning keys into empty, unlocked and locked.

use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::hash::Hash;

use futures::future::BoxFuture;

use super::{Attacher, FairIndex};

/// One schedulable unit of work. It receives an [`Attacher`] when it runs.
pub type WorkItem = Box<dyn FnOnce(Attacher) -> BoxFuture<'static, ()> + Send + 'static>;

/// Pending units for a single key, oldest first.
pub(crate) type SubQueue = VecDeque<WorkItem>;

/// Holding slot for the state token, named by (has ready work, at capacity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    NoWork,
    NoWorkLimited,
    HasWork,
    HasWorkLimited,
}

impl Slot {
    pub(crate) const ALL: [Self; 4] = [
        Self::NoWork,
        Self::NoWorkLimited,
        Self::HasWork,
        Self::HasWorkLimited,
    ];
    /// Slots a producer may take the token from.
    pub(crate) const FOR_PUT: [Self; 2] = [Self::NoWork, Self::HasWork];
    /// Slots a worker may take the token from.
    pub(crate) const FOR_WORK: [Self; 2] = [Self::HasWork, Self::HasWorkLimited];

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::NoWork => 0,
            Self::NoWorkLimited => 1,
            Self::HasWork => 2,
            Self::HasWorkLimited => 3,
        }
    }

    const fn from_predicates(has_work: bool, limited: bool) -> Self {
        match (has_work, limited) {
            (false, false) => Self::NoWork,
            (false, true) => Self::NoWorkLimited,
            (true, false) => Self::HasWork,
            (true, true) => Self::HasWorkLimited,
        }
    }
}

/// The single mutable coordination record. Only the token holder touches it.
pub(crate) struct SharedState<K> {
    empty: HashMap<K, SubQueue>,
    unlocked: FairIndex<K, SubQueue>,
    locked: HashMap<K, SubQueue>,
    size: usize,
    size_limit: usize,
}

impl<K> SharedState<K>
where
    K: Eq + Hash + Clone + Debug,
{
    pub(crate) fn new(size_limit: usize) -> Self {
        Self {
            empty: HashMap::new(),
            unlocked: FairIndex::new(),
            locked: HashMap::new(),
            size: 0,
            size_limit,
        }
    }

    /// Slot matching the current predicates.
    pub(crate) fn slot(&self) -> Slot {
        Slot::from_predicates(!self.unlocked.is_empty(), self.size >= self.size_limit)
    }

    /// Queue `unit` under `key`.
    ///
    /// Keys already unlocked or locked grow in place; only an unseen or empty
    /// key joins the tail of the fairness order.
    pub(crate) fn push(&mut self, key: K, unit: WorkItem) {
        if let Some(queue) = self.unlocked.get_mut(&key) {
            queue.push_back(unit);
        } else if let Some(queue) = self.locked.get_mut(&key) {
            queue.push_back(unit);
        } else {
            let mut queue = self.empty.remove(&key).unwrap_or_default();
            queue.push_back(unit);
            self.unlocked.push_back(key, queue);
        }
        self.size += 1;
    }

    /// Take the head unit of the oldest ready key and lock that key.
    pub(crate) fn take_ready(&mut self) -> Option<(K, WorkItem)> {
        while let Some((key, mut queue)) = self.unlocked.pop_front() {
            if let Some(unit) = queue.pop_front() {
                self.size -= 1;
                self.locked.insert(key.clone(), queue);
                return Some((key, unit));
            }
            tracing::error!(key = ?key, "unlocked key had no pending work");
            self.empty.insert(key, queue);
        }
        None
    }

    /// Unlock `key` after its unit finished.
    pub(crate) fn release(&mut self, key: K) {
        let Some(queue) = self.locked.remove(&key) else {
            tracing::error!(key = ?key, "released key was not locked");
            return;
        };
        if queue.is_empty() {
            self.empty.insert(key, queue);
        } else {
            self.unlocked.push_back(key, queue);
        }
    }

    pub(crate) const fn size(&self) -> usize {
        self.size
    }

    pub(crate) const fn size_limit(&self) -> usize {
        self.size_limit
    }

    pub(crate) fn empty_keys(&self) -> usize {
        self.empty.len()
    }

    pub(crate) fn unlocked_keys(&self) -> usize {
        self.unlocked.len()
    }

    pub(crate) fn locked_keys(&self) -> usize {
        self.locked.len()
    }

    #[cfg(test)]
    fn ready_order(&self) -> Vec<K> {
        self.unlocked.keys().cloned().collect()
    }
}
