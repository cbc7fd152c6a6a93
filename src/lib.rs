//! Mini TTL Cache - a concurrent in-memory cache with sweep-driven expiration
//!
//! Every entry shares one cache-wide TTL. A background sweeper, owned by the
//! cache, removes entries older than the TTL once per TTL period.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CachedEntry, ConcurrentStore, LockedStore, StatsSnapshot, TtlCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::SweeperState;
