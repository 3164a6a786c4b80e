//! Response DTOs for the API
//!
//! Defines the structure of outgoing HTTP response bodies that are not
//! records or pages.

use serde::Serialize;

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy", or "degraded" when the cache backend is unreachable
    pub status: String,
    /// "connected" or "disconnected"
    pub cache: String,
    /// Crate version
    pub version: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Builds the health report from the cache probe result.
    pub fn from_cache_probe(cache_ok: bool) -> Self {
        let (status, cache) = if cache_ok {
            ("healthy", "connected")
        } else {
            ("degraded", "disconnected")
        };
        Self {
            status: status.to_string(),
            cache: cache.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
