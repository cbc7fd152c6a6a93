//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::StatsSnapshot;
use crate::tasks::SweeperState;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted", key),
            key,
        }
    }
}

/// Response body for simple acknowledgements (DELETE /clear, POST /sweeper/stop)
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
}

impl MessageResponse {
    /// Creates a new MessageResponse
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Counters, serialized inline
    #[serde(flatten)]
    pub stats: StatsSnapshot,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Cache-wide TTL in milliseconds
    pub ttl_ms: u64,
    /// Sweeper lifecycle state ("running" or "stopped")
    pub sweeper: &'static str,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a stats snapshot
    pub fn new(stats: StatsSnapshot, ttl_ms: u64, sweeper: SweeperState) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            ttl_ms,
            sweeper: sweeper.as_str(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
