//! TTL Cache Module
//!
//! The cache front end: a concurrent store plus the sweeper that expires it.

use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{CacheStats, CachedEntry, ConcurrentStore, StatsSnapshot};
use crate::error::{CacheError, Result};
use crate::tasks::{shutdown_channel, spawn_sweeper, ShutdownSignal, SweeperState};

/// Default store type: a sharded `DashMap` of shared entries.
pub type DefaultStore<K, V> = DashMap<K, Arc<CachedEntry<V>>>;

// == TTL Cache ==
/// Thread-safe in-memory cache with a single cache-wide TTL.
///
/// Every cache owns one background sweeper, spawned on the current Tokio
/// runtime at construction. The sweeper runs once per `ttl` and removes
/// entries older than `ttl`, so an entry disappears between `ttl` and
/// `2 * ttl` after its last write.
///
/// Reads never check age. An entry past its TTL that has not been swept yet
/// is still returned, and once the sweeper is stopped nothing expires.
///
/// Dropping the cache stops its sweeper.
///
/// # Example
///
/// ```rust,no_run
/// use mini_ttl_cache::TtlCache;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = TtlCache::new(Duration::from_secs(30)).unwrap();
///     cache.set(1, "one");
///     assert_eq!(cache.get(&1), Some("one"));
///     cache.stop_cleanup();
/// }
/// ```
pub struct TtlCache<K, V, S = DefaultStore<K, V>> {
    store: Arc<S>,
    ttl: Duration,
    shutdown: ShutdownSignal,
    sweeper: JoinHandle<()>,
    stats: Arc<CacheStats>,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache backed by a `DashMap` and starts its sweeper.
    ///
    /// # Errors
    /// - [`CacheError::InvalidTtl`] if `ttl` is zero
    /// - [`CacheError::NoRuntime`] if called outside a Tokio runtime
    pub fn new(ttl: Duration) -> Result<Self> {
        Self::with_store(DashMap::new(), ttl)
    }
}

impl<K, V, S> TtlCache<K, V, S>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: ConcurrentStore<K, Arc<CachedEntry<V>>>,
{
    /// Creates a cache over the given store and starts its sweeper.
    ///
    /// Entries already present in `store` are subject to sweeping like any
    /// other.
    pub fn with_store(store: S, ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl(ttl));
        }
        if Handle::try_current().is_err() {
            return Err(CacheError::NoRuntime);
        }

        let store = Arc::new(store);
        let stats = Arc::new(CacheStats::new());
        let (shutdown, listener) = shutdown_channel();
        let sweeper = spawn_sweeper::<K, V, S>(store.clone(), ttl, listener, stats.clone());

        Ok(Self {
            store,
            ttl,
            shutdown,
            sweeper,
            stats,
            _types: PhantomData,
        })
    }

    // == Set ==
    /// Inserts or overwrites the value for `key`.
    ///
    /// The entry is stamped with the current time, restarting its expiration
    /// clock.
    pub fn set(&self, key: K, value: V) {
        self.store.upsert(key, Arc::new(CachedEntry::new(value)));
    }

    // == Get ==
    /// Returns the value stored for `key`, if any.
    ///
    /// No age check happens here; see the type-level docs.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        match self.store.lookup(key) {
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value().clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    /// Returns the full entry for `key`, including its creation time.
    pub fn get_entry(&self, key: &K) -> Option<Arc<CachedEntry<V>>> {
        self.store.lookup(key)
    }

    /// Returns true if `key` currently has an entry. Does not touch stats.
    pub fn contains_key(&self, key: &K) -> bool {
        self.store.lookup(key).is_some()
    }

    // == Delete ==
    /// Removes the entry for `key`. No-op if absent.
    pub fn delete(&self, key: &K) {
        self.store.remove(key);
    }

    // == Clear ==
    /// Removes every entry observed while traversing the store.
    ///
    /// Not atomic: an entry written concurrently with `clear` may or may not
    /// survive it.
    pub fn clear(&self) {
        let mut removed = 0usize;
        self.store.for_each(|key, _| {
            self.store.remove(key);
            removed += 1;
            true
        });
        debug!("Cache cleared: removed {} entries", removed);
    }

    // == Stop Cleanup ==
    /// Signals the sweeper to stop. Does not wait for it to exit.
    ///
    /// After this call entries no longer expire.
    ///
    /// # Panics
    ///
    /// Panics if the sweeper was already stopped. Use
    /// [`try_stop_cleanup`](Self::try_stop_cleanup) to get an error instead.
    pub fn stop_cleanup(&self) {
        if let Err(err) = self.try_stop_cleanup() {
            panic!("stop_cleanup called more than once: {}", err);
        }
    }

    /// Signals the sweeper to stop, reporting a repeated stop as an error.
    ///
    /// # Errors
    /// [`CacheError::SweeperStopped`] if the sweeper was already stopped.
    pub fn try_stop_cleanup(&self) -> Result<()> {
        self.shutdown.fire()
    }

    // == Introspection ==
    /// The cache-wide TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current lifecycle state of the sweeper.
    pub fn sweeper_state(&self) -> SweeperState {
        if self.shutdown.is_fired() || self.sweeper.is_finished() {
            SweeperState::Stopped
        } else {
            SweeperState::Running
        }
    }

    /// Returns true while the sweeper task has not exited.
    ///
    /// Briefly stays true after [`stop_cleanup`](Self::stop_cleanup), until
    /// the task observes the signal.
    pub fn is_cleanup_running(&self) -> bool {
        !self.sweeper.is_finished()
    }

    /// Number of entries currently stored, stale or not.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.store.len())
    }
}

impl<K, V, S> fmt::Debug for TtlCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("stopped", &self.shutdown.is_fired())
            .finish_non_exhaustive()
    }
}
