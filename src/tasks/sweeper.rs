//! TTL Sweeper Task
//!
//! Background task that periodically removes entries older than the cache TTL.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::cache::{CacheStats, CachedEntry, ConcurrentStore};
use crate::tasks::ShutdownListener;

// == Sweeper State ==
/// Lifecycle of a cache's sweeper. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    /// Sweeping once per TTL period
    Running,
    /// Signalled to stop; never resumes
    Stopped,
}

impl SweeperState {
    /// Lowercase name used in logs and API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            SweeperState::Running => "running",
            SweeperState::Stopped => "stopped",
        }
    }
}

/// Removes every entry older than `ttl` as of `now`.
///
/// Staleness is judged under the store's lock at removal time, so an entry
/// overwritten while the sweep runs is kept.
///
/// Returns the number of entries removed.
pub fn sweep_expired<K, V, S>(store: &S, ttl: Duration, now: Instant) -> usize
where
    S: ConcurrentStore<K, Arc<CachedEntry<V>>>,
{
    store.remove_where(|_, entry| entry.is_stale(now, ttl))
}

/// Spawns the sweeper for one cache.
///
/// The first sweep runs one full `ttl` after this call, then once every
/// `ttl`. The task exits when `shutdown` fires or its signal is dropped;
/// if a tick and the shutdown become ready together, shutdown wins.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_sweeper<K, V, S>(
    store: Arc<S>,
    ttl: Duration,
    mut shutdown: ShutdownListener,
    stats: Arc<CacheStats>,
) -> JoinHandle<()>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
    S: ConcurrentStore<K, Arc<CachedEntry<V>>>,
{
    let first_tick = Instant::now() + ttl;

    tokio::spawn(async move {
        info!("Starting TTL sweeper with period of {:?}", ttl);

        let mut ticker = interval_at(first_tick, ttl);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    info!("TTL sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = sweep_expired::<K, V, S>(&store, ttl, Instant::now());
                    stats.record_sweep(removed);

                    if removed > 0 {
                        info!("TTL sweep: removed {} expired entries", removed);
                    } else {
                        debug!("TTL sweep: no expired entries found");
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::shutdown_channel;
    use dashmap::DashMap;

    type Store = DashMap<&'static str, Arc<CachedEntry<&'static str>>>;

    const TTL: Duration = Duration::from_millis(100);

    fn insert_at(store: &Store, key: &'static str, created_at: Instant) {
        store.insert(key, Arc::new(CachedEntry::created_at("value", created_at)));
    }

    fn sweep(store: &Store, now: Instant) -> usize {
        sweep_expired::<&'static str, &'static str, Store>(store, TTL, now)
    }

    fn spawn(
        store: &Arc<Store>,
        listener: ShutdownListener,
        stats: Arc<CacheStats>,
    ) -> JoinHandle<()> {
        spawn_sweeper::<&'static str, &'static str, Store>(store.clone(), TTL, listener, stats)
    }

    #[test]
    fn test_sweep_removes_only_stale_entries() {
        let store = Store::new();
        let now = Instant::now();
        insert_at(&store, "old", now - TTL * 2);
        insert_at(&store, "fresh", now - TTL / 2);

        let removed = sweep(&store, now);

        assert_eq!(removed, 1);
        assert!(!store.contains_key("old"));
        assert!(store.contains_key("fresh"));
    }

    #[test]
    fn test_sweep_keeps_entry_exactly_ttl_old() {
        let store = Store::new();
        let now = Instant::now();
        insert_at(&store, "boundary", now - TTL);

        assert_eq!(sweep(&store, now), 0);
        assert!(store.contains_key("boundary"));
    }

    #[test]
    fn test_sweep_on_empty_store_is_noop() {
        let store = Store::new();
        assert_eq!(sweep(&store, Instant::now()), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_after_period() {
        let store = Arc::new(Store::new());
        let stats = Arc::new(CacheStats::new());
        let (signal, listener) = shutdown_channel();

        let handle = spawn(&store, listener, stats.clone());

        // Written 10ms into the first period
        tokio::time::sleep(Duration::from_millis(10)).await;
        insert_at(&store, "key", Instant::now());

        // First tick at 100ms sees an age of 90ms
        tokio::time::sleep(TTL).await;
        assert!(store.contains_key("key"));

        // Second tick at 200ms evicts it
        tokio::time::sleep(TTL).await;
        assert!(!store.contains_key("key"));

        let snapshot = stats.snapshot(store.len());
        assert_eq!(snapshot.sweeps, 2);
        assert_eq!(snapshot.evictions, 1);

        signal.fire().unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_on_shutdown() {
        let store = Arc::new(Store::new());
        let stats = Arc::new(CacheStats::new());
        let (signal, listener) = shutdown_channel();

        insert_at(&store, "key", Instant::now());
        let handle = spawn(&store, listener, stats.clone());

        signal.fire().unwrap();
        handle.await.unwrap();

        tokio::time::sleep(TTL * 10).await;
        assert!(store.contains_key("key"));
        assert_eq!(stats.snapshot(0).sweeps, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_exits_when_signal_dropped() {
        let store = Arc::new(Store::new());
        let (signal, listener) = shutdown_channel();

        let handle = spawn(&store, listener, Arc::new(CacheStats::new()));
        drop(signal);

        handle.await.unwrap();
    }

    #[test]
    fn test_state_names() {
        assert_eq!(SweeperState::Running.as_str(), "running");
        assert_eq!(SweeperState::Stopped.as_str(), "stopped");
    }
}
