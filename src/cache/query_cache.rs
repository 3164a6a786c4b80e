//! Query Cache
//!
//! Best-effort cache of search pages and single records in front of the
//! record store. Backend failures never reach the caller: reads degrade to
//! [`CacheLookup::StoreError`], writes to `false`, invalidation to `0`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::keys::{record_key, SEARCH_PREFIX};
use crate::cache::{BackendError, CacheBackend, CacheCounters, CacheError, CacheStats, SearchKey};

// == Cache Lookup ==
/// Outcome of a cache read.
///
/// Callers fall back to the record store on both `Miss` and `StoreError`.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// Live entry found and decoded
    Hit(T),
    /// No live entry under the key
    Miss,
    /// Backend unreachable, timed out, or held an undecodable value
    StoreError(String),
}

impl<T> CacheLookup<T> {
    /// Returns the cached value on a hit.
    pub fn hit(self) -> Option<T> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            CacheLookup::Miss | CacheLookup::StoreError(_) => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }
}

// == Cache Settings ==
/// Time bounds applied by the query cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// TTL of single-record entries
    pub default_ttl: Duration,
    /// TTL of search pages
    pub search_ttl: Duration,
    /// Upper bound on a single backend round trip
    pub operation_timeout: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            search_ttl: Duration::from_secs(1800),
            operation_timeout: Duration::from_millis(250),
        }
    }
}

// == Query Cache ==
/// Cache client shared by every request handler.
///
/// Holds no lock-protected state; all entries live in the backend.
#[derive(Debug)]
pub struct QueryCache {
    backend: Arc<dyn CacheBackend>,
    settings: CacheSettings,
    counters: CacheCounters,
}

impl QueryCache {
    /// Creates a cache over `backend`.
    pub fn new(backend: Arc<dyn CacheBackend>, settings: CacheSettings) -> Self {
        Self {
            backend,
            settings,
            counters: CacheCounters::new(),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.settings.default_ttl
    }

    pub fn search_ttl(&self) -> Duration {
        self.settings.search_ttl
    }

    // == Search Pages ==
    /// Looks up a cached search page.
    pub async fn get_cached_search<T: DeserializeOwned>(&self, key: &SearchKey) -> CacheLookup<T> {
        self.read(key.as_str()).await
    }

    /// Stores a search page for `ttl`. Returns whether the write landed.
    pub async fn put_cached_search<T: Serialize>(
        &self,
        key: &SearchKey,
        result: &T,
        ttl: Duration,
    ) -> bool {
        self.write(key.as_str(), result, ttl).await
    }

    /// Drops every cached search page.
    ///
    /// Mutation handlers call this after each successful write, before
    /// responding. Returns the number of entries removed (0 when the backend
    /// is unavailable).
    pub async fn invalidate_all_searches(&self) -> u64 {
        match self.bounded(self.backend.delete_prefix(SEARCH_PREFIX)).await {
            Ok(removed) => {
                debug!("Invalidated {} search cache entries", removed);
                self.counters.record_invalidated(removed);
                removed
            }
            Err(err) => {
                warn!("Search cache invalidation failed: {}", err);
                self.counters.record_store_error();
                0
            }
        }
    }

    // == Records ==
    /// Looks up a cached single-record view.
    pub async fn get_record<T: DeserializeOwned>(&self, id: i64) -> CacheLookup<T> {
        self.read(&record_key(id)).await
    }

    /// Stores a single-record view for `ttl`. Returns whether the write landed.
    pub async fn put_record<T: Serialize>(&self, id: i64, data: &T, ttl: Duration) -> bool {
        self.write(&record_key(id), data, ttl).await
    }

    /// Drops the cached view of one record.
    ///
    /// A non-positive id is a caller bug and is the only error returned.
    /// Backend failures yield `Ok(false)`.
    pub async fn invalidate_record(&self, id: i64) -> Result<bool, CacheError> {
        if id <= 0 {
            return Err(CacheError::InvalidRecordId(id));
        }

        let key = record_key(id);
        match self.bounded(self.backend.delete(&key)).await {
            Ok(removed) => {
                if removed {
                    debug!("Invalidated {}", key);
                    self.counters.record_invalidated(1);
                }
                Ok(removed)
            }
            Err(err) => {
                warn!("Invalidation of {} failed: {}", key, err);
                self.counters.record_store_error();
                Ok(false)
            }
        }
    }

    // == Health ==
    /// Pings the backend.
    pub async fn health_check(&self) -> bool {
        match self.bounded(self.backend.ping()).await {
            Ok(()) => true,
            Err(err) => {
                warn!("Cache health check failed: {}", err);
                false
            }
        }
    }

    /// Counters plus the backend key count when reachable.
    pub async fn stats(&self) -> CacheStats {
        let total_keys = self.bounded(self.backend.key_count()).await.ok();
        self.counters.snapshot(total_keys)
    }

    // == Internals ==
    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, BackendError>>,
    ) -> Result<T, BackendError> {
        let limit = self.settings.operation_timeout;
        tokio::time::timeout(limit, op)
            .await
            .unwrap_or(Err(BackendError::Timeout(limit)))
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let raw = match self.bounded(self.backend.get(key)).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("Cache miss: {}", key);
                self.counters.record_miss();
                return CacheLookup::Miss;
            }
            Err(err) => {
                warn!("Cache read of {} failed: {}", key, err);
                self.counters.record_store_error();
                return CacheLookup::StoreError(err.to_string());
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                self.counters.record_hit();
                CacheLookup::Hit(value)
            }
            Err(err) => {
                let err = BackendError::Malformed(err.to_string());
                warn!("Cache entry {} unreadable: {}", key, err);
                self.counters.record_store_error();
                CacheLookup::StoreError(err.to_string())
            }
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("Cache value for {} not serializable: {}", key, err);
                self.counters.record_store_error();
                return false;
            }
        };

        match self.bounded(self.backend.set(key, raw, ttl)).await {
            Ok(()) => {
                self.counters.record_write();
                true
            }
            Err(err) => {
                warn!("Cache write of {} failed: {}", key, err);
                self.counters.record_store_error();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryBackend, QueryDescriptor};
    use async_trait::async_trait;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Page {
        items: Vec<String>,
        total: u64,
    }

    fn page(items: &[&str]) -> Page {
        Page {
            items: items.iter().map(|s| s.to_string()).collect(),
            total: items.len() as u64,
        }
    }

    fn memory_cache() -> (Arc<MemoryBackend>, QueryCache) {
        let backend = Arc::new(MemoryBackend::new());
        let cache = QueryCache::new(backend.clone(), CacheSettings::default());
        (backend, cache)
    }

    /// Backend whose every call fails as if the connection were refused.
    #[derive(Debug)]
    struct DownBackend;

    #[async_trait]
    impl CacheBackend for DownBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> Result<bool, BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
        async fn delete_prefix(&self, _prefix: &str) -> Result<u64, BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
        async fn ping(&self) -> Result<(), BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
        async fn key_count(&self) -> Result<u64, BackendError> {
            Err(BackendError::Unavailable("connection refused".into()))
        }
    }

    /// Backend that never answers.
    #[derive(Debug)]
    struct StalledBackend;

    #[async_trait]
    impl CacheBackend for StalledBackend {
        async fn get(&self, _key: &str) -> Result<Option<String>, BackendError> {
            std::future::pending().await
        }
        async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), BackendError> {
            std::future::pending().await
        }
        async fn delete(&self, _key: &str) -> Result<bool, BackendError> {
            std::future::pending().await
        }
        async fn delete_prefix(&self, _prefix: &str) -> Result<u64, BackendError> {
            std::future::pending().await
        }
        async fn ping(&self) -> Result<(), BackendError> {
            std::future::pending().await
        }
        async fn key_count(&self) -> Result<u64, BackendError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_search_round_trip() {
        let (_, cache) = memory_cache();
        let key = QueryDescriptor::new().with_nome("maria").search_key();
        let value = page(&["Maria Silva"]);

        assert!(cache.put_cached_search(&key, &value, cache.search_ttl()).await);
        assert_eq!(cache.get_cached_search::<Page>(&key).await, CacheLookup::Hit(value));
    }

    #[tokio::test]
    async fn test_search_miss() {
        let (_, cache) = memory_cache();
        let lookup = cache.get_cached_search::<Page>(&SearchKey::all()).await;
        assert_eq!(lookup, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_page() {
        let (_, cache) = memory_cache();
        let key = SearchKey::all();

        cache.put_cached_search(&key, &page(&["a"]), cache.search_ttl()).await;
        cache.put_cached_search(&key, &page(&["b"]), cache.search_ttl()).await;

        assert_eq!(cache.get_cached_search::<Page>(&key).await.hit(), Some(page(&["b"])));
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_all_expires_after_ttl() {
        let (_, cache) = memory_cache();
        let key = SearchKey::all();

        cache
            .put_cached_search(&key, &page(&["a"]), Duration::from_secs(5))
            .await;
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(cache.get_cached_search::<Page>(&key).await.is_hit());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.get_cached_search::<Page>(&key).await, CacheLookup::Miss);
    }

    #[tokio::test]
    async fn test_invalidate_all_searches_keeps_records() {
        let (_, cache) = memory_cache();
        let ttl = cache.search_ttl();
        let filtered = QueryDescriptor::new().with_uf("SP").search_key();

        cache.put_cached_search(&SearchKey::all(), &page(&["a"]), ttl).await;
        cache.put_cached_search(&filtered, &page(&["b"]), ttl).await;
        cache.put_record(7, &"record seven", cache.default_ttl()).await;

        assert_eq!(cache.invalidate_all_searches().await, 2);

        assert_eq!(cache.get_cached_search::<Page>(&SearchKey::all()).await, CacheLookup::Miss);
        assert_eq!(cache.get_cached_search::<Page>(&filtered).await, CacheLookup::Miss);
        assert_eq!(
            cache.get_record::<String>(7).await,
            CacheLookup::Hit("record seven".to_string())
        );
    }

    #[tokio::test]
    async fn test_invalidate_record_is_scoped() {
        let (_, cache) = memory_cache();
        let ttl = cache.default_ttl();

        cache.put_record(1, &"one", ttl).await;
        cache.put_record(2, &"two", ttl).await;
        cache.put_cached_search(&SearchKey::all(), &page(&["one", "two"]), ttl).await;

        assert_eq!(cache.invalidate_record(1).await, Ok(true));
        assert_eq!(cache.invalidate_record(1).await, Ok(false));

        assert_eq!(cache.get_record::<String>(1).await, CacheLookup::Miss);
        assert!(cache.get_record::<String>(2).await.is_hit());
        assert!(cache.get_cached_search::<Page>(&SearchKey::all()).await.is_hit());
    }

    #[tokio::test]
    async fn test_invalidate_record_rejects_bad_id() {
        let (_, cache) = memory_cache();

        assert_eq!(cache.invalidate_record(0).await, Err(CacheError::InvalidRecordId(0)));
        assert_eq!(cache.invalidate_record(-3).await, Err(CacheError::InvalidRecordId(-3)));
    }

    #[tokio::test]
    async fn test_malformed_value_is_store_error() {
        let (backend, cache) = memory_cache();
        backend
            .set(SearchKey::all().as_str(), "{not json".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let lookup = cache.get_cached_search::<Page>(&SearchKey::all()).await;
        assert!(matches!(lookup, CacheLookup::StoreError(_)));
        assert_eq!(cache.stats().await.store_errors, 1);
    }

    #[tokio::test]
    async fn test_connection_error_degrades_to_store_error() {
        let cache = QueryCache::new(Arc::new(DownBackend), CacheSettings::default());
        let key = SearchKey::all();

        let lookup = cache.get_cached_search::<Page>(&key).await;
        assert!(matches!(lookup, CacheLookup::StoreError(_)));
        assert_eq!(lookup.hit(), None);

        assert!(!cache.put_cached_search(&key, &page(&["a"]), cache.search_ttl()).await);
        assert!(matches!(cache.get_record::<Page>(3).await, CacheLookup::StoreError(_)));
        assert!(!cache.put_record(3, &page(&["a"]), cache.default_ttl()).await);
        assert_eq!(cache.invalidate_record(3).await, Ok(false));
        assert_eq!(cache.invalidate_all_searches().await, 0);
        assert!(!cache.health_check().await);

        let stats = cache.stats().await;
        assert_eq!(stats.store_errors, 6);
        assert_eq!(stats.total_keys, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_degrades_to_store_error() {
        let settings = CacheSettings {
            operation_timeout: Duration::from_millis(50),
            ..CacheSettings::default()
        };
        let cache = QueryCache::new(Arc::new(StalledBackend), settings);

        let lookup = cache.get_cached_search::<Page>(&SearchKey::all()).await;
        assert_eq!(
            lookup,
            CacheLookup::StoreError(BackendError::Timeout(Duration::from_millis(50)).to_string())
        );
        assert!(!cache.put_record(1, &"one", cache.default_ttl()).await);
        assert!(!cache.health_check().await);
    }

    #[tokio::test]
    async fn test_health_check_ok() {
        let (_, cache) = memory_cache();
        assert!(cache.health_check().await);
    }

    #[tokio::test]
    async fn test_stats_track_outcomes() {
        let (_, cache) = memory_cache();
        let key = SearchKey::all();

        cache.get_cached_search::<Page>(&key).await;
        cache.put_cached_search(&key, &page(&["a"]), cache.search_ttl()).await;
        cache.get_cached_search::<Page>(&key).await;

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.total_keys, Some(1));
        assert_eq!(stats.hit_rate, 0.5);
    }
}
