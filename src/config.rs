//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default cache-wide TTL in milliseconds
pub const DEFAULT_TTL_MS: u64 = 60_000;

/// Default HTTP server port
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Cache-wide TTL in milliseconds; also the sweep period
    pub ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MS` - Cache-wide TTL in milliseconds (default: 60000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    ///
    /// Unparseable values fall back to the default. A TTL of zero is not a
    /// valid cache TTL and also falls back.
    pub fn from_env() -> Self {
        Self {
            ttl_ms: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ttl: &u64| *ttl > 0)
                .unwrap_or(DEFAULT_TTL_MS),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
        }
    }

    /// The configured TTL as a `Duration`.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_TTL_MS,
            server_port: DEFAULT_SERVER_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.ttl_ms, 60_000);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.ttl(), Duration::from_secs(60));
    }

    // Env vars are process-global, so every env case lives in one test
    #[test]
    fn test_config_from_env() {
        env::remove_var("CACHE_TTL_MS");
        env::remove_var("SERVER_PORT");
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("CACHE_TTL_MS", "250");
        env::set_var("SERVER_PORT", "8080");
        let config = Config::from_env();
        assert_eq!(config.ttl(), Duration::from_millis(250));
        assert_eq!(config.server_port, 8080);

        env::set_var("CACHE_TTL_MS", "0");
        env::set_var("SERVER_PORT", "not-a-port");
        assert_eq!(Config::from_env(), Config::default());

        env::remove_var("CACHE_TTL_MS");
        env::remove_var("SERVER_PORT");
    }
}
