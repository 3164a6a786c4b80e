//! Cache Module
//!
//! Search result and record caching in front of the record store, plus the
//! key/value backends it runs on.

mod backend;
mod entry;
mod error;
pub mod keys;
mod memory;
mod query_cache;
mod redis_backend;
mod stats;


// Re-export public types
pub use backend::CacheBackend;
pub use entry::CacheEntry;
pub use error::{BackendError, CacheError};
pub use keys::{derive_search_key, record_key, QueryDescriptor, SearchKey};
pub use memory::MemoryBackend;
pub use query_cache::{CacheLookup, CacheSettings, QueryCache};
pub use redis_backend::RedisBackend;
pub use stats::{CacheCounters, CacheStats};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
