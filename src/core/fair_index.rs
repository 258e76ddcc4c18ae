//! Insertion-ordered map used to pick the next ready key.
//!
//! `FairIndex` keeps a `HashMap` from key to slot plus a linked list threaded
//! through a slab of nodes. Lookup, append-at-tail and pop-oldest are all
//! O(1); freed slots are recycled so a long-running bot does not grow the
//! slab beyond the peak number of simultaneously ready keys.

use std::collections::HashMap;
use std::hash::Hash;

struct Node<K, V> {
    key: K,
    value: V,
    next: Option<usize>,
}

/// Insertion-ordered associative structure with O(1) lookup and pop-oldest.
pub struct FairIndex<K, V> {
    slots: HashMap<K, usize>,
    nodes: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K, V> Default for FairIndex<K, V> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
            nodes: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }
}

impl<K, V> FairIndex<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when no key is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Mutable access to the value stored under `key`, without reordering.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let idx = *self.slots.get(key)?;
        self.nodes[idx].as_mut().map(|node| &mut node.value)
    }

    /// Append `key` at the tail.
    ///
    /// If the key is already present its value is replaced in place and the old
    /// value returned; its position is left untouched.
    pub fn push_back(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.get_mut(&key) {
            return Some(std::mem::replace(slot, value));
        }

        let node = Node {
            key: key.clone(),
            value,
            next: None,
        };
        let idx = if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        };

        match self.tail.and_then(|tail| self.nodes[tail].as_mut()) {
            Some(tail_node) => tail_node.next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
        self.slots.insert(key, idx);
        None
    }

    /// Remove and return the oldest entry.
    pub fn pop_front(&mut self) -> Option<(K, V)> {
        let idx = self.head?;
        let node = self.nodes[idx].take()?;

        self.head = node.next;
        if self.head.is_none() {
            self.tail = None;
        }
        self.slots.remove(&node.key);
        self.free.push(idx);
        Some((node.key, node.value))
    }

    #[cfg(test)]
    pub(crate) fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.nodes[cursor?].as_ref()?;
            cursor = node.next;
            Some(&node.key)
        })
    }
}
