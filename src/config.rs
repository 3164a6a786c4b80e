//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheSettings;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Redis address; the in-process backend is used when unset
    pub redis_url: Option<String>,
    /// TTL in seconds of single-record cache entries
    pub default_ttl: u64,
    /// TTL in seconds of search result cache entries
    pub search_ttl: u64,
    /// Page size used when a search omits `size`
    pub default_page_size: u32,
    /// Largest accepted page size
    pub max_page_size: u32,
    /// In-process backend sweep interval in seconds
    pub cleanup_interval: u64,
    /// Bound on a single cache backend round trip, in milliseconds
    pub cache_timeout_ms: u64,
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `REDIS_URL` - Redis address, e.g. `redis://localhost:6379/0` (default: unset)
    /// - `CACHE_TTL` - Record cache TTL in seconds (default: 3600)
    /// - `SEARCH_CACHE_TTL` - Search cache TTL in seconds (default: 1800)
    /// - `DEFAULT_PAGE_SIZE` - Default page size (default: 50)
    /// - `MAX_PAGE_SIZE` - Maximum page size (default: 100)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 5)
    /// - `CACHE_TIMEOUT_MS` - Cache round-trip bound in milliseconds (default: 250)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            redis_url: env::var("REDIS_URL").ok().filter(|v| !v.trim().is_empty()),
            default_ttl: env_or("CACHE_TTL", defaults.default_ttl),
            search_ttl: env_or("SEARCH_CACHE_TTL", defaults.search_ttl),
            default_page_size: env_or("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            max_page_size: env_or("MAX_PAGE_SIZE", defaults.max_page_size),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            cache_timeout_ms: env_or("CACHE_TIMEOUT_MS", defaults.cache_timeout_ms),
        }
    }

    /// Cache time bounds derived from this configuration.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            default_ttl: Duration::from_secs(self.default_ttl),
            search_ttl: Duration::from_secs(self.search_ttl),
            operation_timeout: Duration::from_millis(self.cache_timeout_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            redis_url: None,
            default_ttl: 3600,
            search_ttl: 1800,
            default_page_size: 50,
            max_page_size: 100,
            cleanup_interval: 5,
            cache_timeout_ms: 250,
        }
    }
}
