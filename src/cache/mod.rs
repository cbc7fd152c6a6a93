//! Cache Module
//!
//! Provides the concurrent in-memory cache with sweep-driven TTL expiration.

mod entry;
mod stats;
mod store;
mod ttl_cache;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CachedEntry;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{ConcurrentStore, LockedStore};
pub use ttl_cache::{DefaultStore, TtlCache};
