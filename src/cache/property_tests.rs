//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache against a plain `HashMap` model, on both
//! store backends.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CachedEntry, ConcurrentStore, LockedStore, TtlCache};

// == Test Configuration ==
// Long enough that no sweep runs while a case executes
const TEST_TTL: Duration = Duration::from_secs(3600);

// == Strategies ==
/// Generates cache keys from a small space so operations collide often
fn key_strategy() -> impl Strategy<Value = u16> {
    0u16..64
}

/// Generates cache values
fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{0,32}"
}

/// A single cache operation
#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: u16, value: String },
    Get { key: u16 },
    Delete { key: u16 },
    Clear,
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        4 => key_strategy().prop_map(|key| CacheOp::Get { key }),
        2 => key_strategy().prop_map(|key| CacheOp::Delete { key }),
        1 => Just(CacheOp::Clear),
    ]
}

/// Replays `ops` against the cache and a `HashMap` model, checking every read.
fn check_against_model<S>(
    cache: &TtlCache<u16, String, S>,
    ops: Vec<CacheOp>,
) -> Result<(), TestCaseError>
where
    S: ConcurrentStore<u16, Arc<CachedEntry<String>>>,
{
    let mut model: HashMap<u16, String> = HashMap::new();
    let mut expected_hits = 0u64;
    let mut expected_misses = 0u64;

    for op in ops {
        match op {
            CacheOp::Set { key, value } => {
                cache.set(key, value.clone());
                model.insert(key, value);
            }
            CacheOp::Get { key } => {
                let expected = model.get(&key).cloned();
                if expected.is_some() {
                    expected_hits += 1;
                } else {
                    expected_misses += 1;
                }
                prop_assert_eq!(cache.get(&key), expected, "Get mismatch for key {}", key);
            }
            CacheOp::Delete { key } => {
                cache.delete(&key);
                model.remove(&key);
            }
            CacheOp::Clear => {
                cache.clear();
                model.clear();
            }
        }
    }

    prop_assert_eq!(cache.len(), model.len(), "Entry count mismatch");
    for (key, value) in &model {
        let found = cache.get(key);
        prop_assert_eq!(found.as_ref(), Some(value));
        expected_hits += 1;
    }

    let stats = cache.stats();
    prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
    prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
    prop_assert_eq!(stats.evictions, 0, "Nothing should have been swept");
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any sequence of set/get/delete/clear on the DashMap-backed cache
    // behaves like a HashMap: reads return the last write, deletes and
    // clears remove, and stats count every hit and miss.
    #[test]
    fn prop_dashmap_cache_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..100)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();

        let cache = TtlCache::new(TEST_TTL).unwrap();
        check_against_model(&cache, ops)?;
        cache.stop_cleanup();
    }

    // Same model check over the RwLock<HashMap> store.
    #[test]
    fn prop_locked_store_cache_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..100)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();

        let cache = TtlCache::with_store(LockedStore::new(), TEST_TTL).unwrap();
        check_against_model(&cache, ops)?;
        cache.stop_cleanup();
    }

    // Writes from many threads to disjoint keys are all visible afterwards.
    #[test]
    fn prop_concurrent_disjoint_writes_visible(
        keys in prop::collection::hash_set(any::<u32>(), 1..200),
        threads in 1usize..8
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();

        let cache = TtlCache::new(TEST_TTL).unwrap();
        let keys: Vec<u32> = keys.into_iter().collect();
        let chunk = keys.len().div_ceil(threads);

        std::thread::scope(|scope| {
            for part in keys.chunks(chunk) {
                let cache = &cache;
                scope.spawn(move || {
                    for key in part {
                        cache.set(*key, key.wrapping_mul(3));
                    }
                });
            }
        });

        prop_assert_eq!(cache.len(), keys.len());
        for key in &keys {
            prop_assert_eq!(cache.get(key), Some(key.wrapping_mul(3)));
        }
    }

    // Racing sets and deletes on overlapping keys never leave a value that
    // was not written for that key.
    #[test]
    fn prop_concurrent_set_delete_consistent(
        keys in prop::collection::vec(key_strategy(), 1..50)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();

        let cache = TtlCache::new(TEST_TTL).unwrap();
        let written: HashSet<u16> = keys.iter().copied().collect();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let cache = &cache;
                let keys = &keys;
                scope.spawn(move || {
                    for key in keys {
                        cache.set(*key, format!("value_{}", key));
                    }
                });
                scope.spawn(move || {
                    for key in keys.iter().rev() {
                        cache.delete(key);
                    }
                });
            }
        });

        for key in 0u16..64 {
            if let Some(value) = cache.get(&key) {
                prop_assert!(written.contains(&key), "Key {} was never written", key);
                prop_assert_eq!(value, format!("value_{}", key));
            }
        }
    }
}
