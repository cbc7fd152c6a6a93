//! Concurrent Store Module
//!
//! The thread-safe key-value map the cache is built on, expressed as a trait
//! so the cache does not depend on one particular map implementation.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

use dashmap::DashMap;

// == Concurrent Store Trait ==
/// A thread-safe associative store with per-key atomicity.
///
/// Every operation may be called from any number of threads at once. The
/// traversal in [`for_each`](ConcurrentStore::for_each) is weakly consistent:
/// it may or may not observe mutations made while it runs, and the visitor
/// is allowed to call back into the store (including removing the key it is
/// visiting).
pub trait ConcurrentStore<K, E>: Send + Sync + 'static {
    /// Inserts `entry` under `key`, replacing any previous entry.
    fn upsert(&self, key: K, entry: E);

    /// Returns the entry currently stored under `key`.
    fn lookup(&self, key: &K) -> Option<E>;

    /// Removes the entry under `key`. No-op if absent.
    fn remove(&self, key: &K);

    /// Removes the entry under `key` only if `pred` holds for the entry that
    /// is present at removal time. Returns whether an entry was removed.
    fn remove_if<F>(&self, key: &K, pred: F) -> bool
    where
        F: FnOnce(&E) -> bool;

    /// Removes every entry for which `pred` holds and returns how many were
    /// removed.
    ///
    /// `pred` is evaluated against the entry present at removal time, so a
    /// concurrent overwrite is judged on its new value. It must not call back
    /// into the store.
    fn remove_where<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&K, &E) -> bool,
    {
        let mut removed = 0;
        self.for_each(|key, entry| {
            if pred(key, entry) && self.remove_if(key, |current| pred(key, current)) {
                removed += 1;
            }
            true
        });
        removed
    }

    /// Visits every entry. Returning `false` from the visitor stops the traversal.
    fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&K, &E) -> bool;

    /// Number of entries currently stored.
    fn len(&self) -> usize;

    /// Returns true if the store holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == DashMap ==
// Sharded map; the default store for the cache.
impl<K, E> ConcurrentStore<K, E> for DashMap<K, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn upsert(&self, key: K, entry: E) {
        self.insert(key, entry);
    }

    fn lookup(&self, key: &K) -> Option<E> {
        self.get(key).map(|entry| entry.value().clone())
    }

    fn remove(&self, key: &K) {
        DashMap::remove(self, key);
    }

    fn remove_if<F>(&self, key: &K, pred: F) -> bool
    where
        F: FnOnce(&E) -> bool,
    {
        DashMap::remove_if(self, key, |_, entry| pred(entry)).is_some()
    }

    fn remove_where<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&K, &E) -> bool,
    {
        // One shard write lock at a time, no snapshot
        let mut removed = 0;
        self.retain(|key, entry| {
            let matched = pred(key, &*entry);
            if matched {
                removed += 1;
            }
            !matched
        });
        removed
    }

    fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &E) -> bool,
    {
        // Iterating holds shard read locks; snapshot first so the visitor
        // can remove keys without deadlocking on its own shard.
        let snapshot: Vec<(K, E)> = self
            .iter()
            .map(|item| (item.key().clone(), item.value().clone()))
            .collect();

        for (key, entry) in &snapshot {
            if !visitor(key, entry) {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        DashMap::len(self)
    }
}

// == Locked Store ==
/// A single `RwLock<HashMap>` store.
///
/// Simpler than a sharded map and fine for low-contention workloads. All
/// writers serialize on one lock.
#[derive(Debug)]
pub struct LockedStore<K, E> {
    entries: RwLock<HashMap<K, E>>,
}

impl<K, E> LockedStore<K, E> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, E> Default for LockedStore<K, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> ConcurrentStore<K, E> for LockedStore<K, E>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn upsert(&self, key: K, entry: E) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    fn lookup(&self, key: &K) -> Option<E> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn remove(&self, key: &K) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn remove_if<F>(&self, key: &K, pred: F) -> bool
    where
        F: FnOnce(&E) -> bool,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let matched = entries.get(key).is_some_and(pred);
        if matched {
            entries.remove(key);
        }
        matched
    }

    fn remove_where<F>(&self, mut pred: F) -> usize
    where
        F: FnMut(&K, &E) -> bool,
    {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|key, entry| !pred(key, &*entry));
        before - entries.len()
    }

    fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&K, &E) -> bool,
    {
        let snapshot: Vec<(K, E)> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();

        for (key, entry) in &snapshot {
            if !visitor(key, entry) {
                break;
            }
        }
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
