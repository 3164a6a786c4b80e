//! Cache Error Types
//!
//! Two error families live here. `BackendError` describes environmental
//! failures of the key/value store and never escapes `QueryCache`.
//! `CacheError` describes caller misuse and is the only error the cache
//! propagates.

use std::time::Duration;

use thiserror::Error;

// == Backend Error ==
/// Failure reported by a cache backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Store could not be reached or refused the command
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    /// Stored value could not be decoded
    #[error("malformed cache value: {0}")]
    Malformed(String),

    /// Store rejected the write (key or value outside its limits)
    #[error("cache write rejected: {0}")]
    Rejected(String),

    /// Operation did not complete within the configured bound
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<redis::RedisError> for BackendError {
    fn from(err: redis::RedisError) -> Self {
        BackendError::Unavailable(err.to_string())
    }
}

// == Cache Error ==
/// Programming errors on the caller side.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Record identifiers are strictly positive
    #[error("invalid record id: {0}")]
    InvalidRecordId(i64),

    /// Filter name is not part of the query descriptor
    #[error("unknown search filter: {0}")]
    UnknownFilter(String),

    /// Filter value cannot be parsed for its field
    #[error("invalid value {value:?} for search filter {field}")]
    InvalidFilterValue { field: String, value: String },
}
