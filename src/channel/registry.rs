//! Non-Owning Listener Registry
//!
//! Holds weak references to handlers and observers owned elsewhere.
//! Registration order is kept, duplicates are refused, and entries whose
//! owner has gone away are skipped when notifying and pruned on the next
//! mutation.

use std::sync::{Arc, Weak};

/// Ordered set of weak listener references
pub struct ListenerSet<T: ?Sized> {
    entries: Vec<Weak<T>>,
}

impl<T: ?Sized> ListenerSet<T> {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add `listener`; returns `false` if it is already present
    pub fn add(&mut self, listener: &Arc<T>) -> bool {
        self.prune();
        if self.contains(listener) {
            return false;
        }
        self.entries.push(Arc::downgrade(listener));
        true
    }

    /// Remove `listener`; returns `false` if it was not present
    pub fn remove(&mut self, listener: &Arc<T>) -> bool {
        self.prune();
        let target = Arc::downgrade(listener);
        let before = self.entries.len();
        self.entries.retain(|entry| !entry.ptr_eq(&target));
        self.entries.len() != before
    }

    /// Whether `listener` is registered
    pub fn contains(&self, listener: &Arc<T>) -> bool {
        let target = Arc::downgrade(listener);
        self.entries.iter().any(|entry| entry.ptr_eq(&target))
    }

    /// Live listeners in registration order
    ///
    /// The returned strong references keep every listener alive for the
    /// duration of one fan-out.
    pub fn live(&self) -> Vec<Arc<T>> {
        self.entries.iter().filter_map(Weak::upgrade).collect()
    }

    /// Number of live listeners
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.strong_count() > 0)
            .count()
    }

    /// Whether no live listener is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries whose owner is gone
    pub fn prune(&mut self) {
        self.entries.retain(|entry| entry.strong_count() > 0);
    }
}

impl<T: ?Sized> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for ListenerSet<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerSet")
            .field("entries", &self.entries.len())
            .field("live", &self.len())
            .finish()
    }
}
