//! Cache Statistics Module
//!
//! Tracks query cache outcomes without locking.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Counters ==
/// Live counters updated by every cache operation.
#[derive(Debug, Default)]
pub struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    store_errors: AtomicU64,
    writes: AtomicU64,
    invalidated: AtomicU64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidated(&self, count: u64) {
        self.invalidated.fetch_add(count, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Copies the counters into a serializable report.
    pub fn snapshot(&self, total_keys: Option<u64>) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            invalidated: self.invalidated.load(Ordering::Relaxed),
            total_keys,
            hit_rate: 0.0,
        };
        stats.hit_rate = stats.compute_hit_rate();
        stats
    }
}

// == Cache Stats ==
/// Point-in-time view of cache performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Operations that failed against the backend (counted as misses for reads)
    pub store_errors: u64,
    /// Successful writes
    pub writes: u64,
    /// Entries removed by invalidation
    pub invalidated: u64,
    /// Keys held by the backend, `None` when it is unreachable
    pub total_keys: Option<u64>,
    /// hits / (hits + misses + store_errors)
    pub hit_rate: f64,
}

impl CacheStats {
    fn compute_hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.store_errors;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
