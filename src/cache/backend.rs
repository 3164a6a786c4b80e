//! Cache Backend Trait
//!
//! The key/value store the query cache delegates storage, expiry and
//! key-level write ordering to.

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;

use crate::cache::BackendError;

/// External key/value store holding serialized cache entries.
///
/// Implementations own expiry: a key whose TTL elapsed must read as absent.
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    /// Returns the raw value stored under `key`, if present and live.
    async fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Stores `value` under `key`, replacing any previous value and TTL.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), BackendError>;

    /// Removes `key`. Returns whether a live entry was removed.
    async fn delete(&self, key: &str) -> Result<bool, BackendError>;

    /// Removes every key starting with `prefix`. Returns the number removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, BackendError>;

    /// Round-trips to the store.
    async fn ping(&self) -> Result<(), BackendError>;

    /// Number of keys currently held.
    async fn key_count(&self) -> Result<u64, BackendError>;
}
