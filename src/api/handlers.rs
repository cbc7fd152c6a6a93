//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::warn;

use crate::cache::TtlCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, MessageResponse, SetRequest, SetResponse,
    StatsResponse,
};
use crate::tasks::SweeperState;

/// Application state shared across all handlers.
///
/// The cache synchronizes internally, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// String-keyed cache served over HTTP
    pub cache: Arc<TtlCache<String, String>>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: TtlCache<String, String>) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Starts the cache's sweeper, so this must run inside a Tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(TtlCache::new(config.ttl())?))
    }

    /// Stops the sweeper during server shutdown.
    ///
    /// Returns false if it was already stopped, e.g. through `POST /sweeper/stop`.
    pub fn stop_sweeper_on_shutdown(&self) -> bool {
        if self.cache.sweeper_state() == SweeperState::Stopped {
            return false;
        }
        self.cache.try_stop_cleanup().is_ok()
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.set(req.key.clone(), req.value);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a value from the cache by key.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key) {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Deletes a key from the cache. Deleting an absent key succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    state.cache.delete(&key);

    Json(DeleteResponse::new(key))
}

/// Handler for DELETE /clear
///
/// Removes every entry from the cache.
pub async fn clear_handler(State(state): State<AppState>) -> Json<MessageResponse> {
    state.cache.clear();

    Json(MessageResponse::new("Cache cleared"))
}

/// Handler for POST /sweeper/stop
///
/// Stops the background sweeper. Entries stop expiring afterwards.
/// A second call is rejected with 409 Conflict.
pub async fn stop_sweeper_handler(
    State(state): State<AppState>,
) -> Result<Json<MessageResponse>> {
    state.cache.try_stop_cleanup().inspect_err(|_| {
        warn!("Rejected request to stop an already stopped TTL sweeper");
    })?;

    Ok(Json(MessageResponse::new("TTL sweeper stopped")))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = &state.cache;
    let ttl_ms = u64::try_from(cache.ttl().as_millis()).unwrap_or(u64::MAX);

    Json(StatsResponse::new(cache.stats(), ttl_ms, cache.sweeper_state()))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
