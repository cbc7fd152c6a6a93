//! Cache Entry Module
//!
//! Defines the immutable (value, creation time) pair stored for every key.

use std::time::Duration;

use tokio::time::Instant;

// == Cached Entry ==
/// A single cache entry: the stored value and the moment it was written.
///
/// Entries are never mutated after construction. Overwriting a key replaces
/// the whole entry, which also resets its expiration clock.
#[derive(Debug, Clone)]
pub struct CachedEntry<V> {
    value: V,
    created_at: Instant,
}

impl<V> CachedEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: V) -> Self {
        Self::created_at(value, Instant::now())
    }

    /// Creates an entry with an explicit creation time.
    pub fn created_at(value: V, created_at: Instant) -> Self {
        Self { value, created_at }
    }

    /// Returns the stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the instant this entry was written.
    pub fn creation_time(&self) -> Instant {
        self.created_at
    }

    /// Age of the entry as observed at `now`. Zero if `now` precedes creation.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.created_at)
    }

    // == Staleness ==
    /// Checks whether the entry is older than `ttl` at `now`.
    ///
    /// The comparison is strict: an entry whose age is exactly `ttl` is not
    /// stale yet and survives until the following sweep.
    pub fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) > ttl
    }
}
