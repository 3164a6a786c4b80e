//! API Handlers
//!
//! HTTP request handlers for the client endpoints. Reads go through the
//! query cache and fall back to the record store; writes invalidate the
//! cache before responding.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};

use crate::cache::{CacheLookup, CacheStats, QueryCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{HealthResponse, PageLimits, SearchParams};
use crate::records::{Client, ClientCreate, ClientUpdate, RecordStore, SearchPage};

/// Application state shared across all handlers.
///
/// Built once by the composition root and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    /// Search and record cache
    pub cache: Arc<QueryCache>,
    /// Source of truth for client records
    pub records: Arc<dyn RecordStore>,
    /// Search page size limits
    pub limits: PageLimits,
}

impl AppState {
    /// Creates a new AppState from its collaborators.
    pub fn new(cache: Arc<QueryCache>, records: Arc<dyn RecordStore>, limits: PageLimits) -> Self {
        Self {
            cache,
            records,
            limits,
        }
    }

    /// Creates a new AppState using the page limits from configuration.
    pub fn from_config(
        config: &Config,
        cache: Arc<QueryCache>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        let limits = PageLimits {
            default_size: config.default_page_size,
            max_size: config.max_page_size,
        };
        Self::new(cache, records, limits)
    }

    /// Drops every cache entry a write to record `id` may have made stale.
    async fn invalidate_after_write(&self, id: i64) -> Result<()> {
        self.cache.invalidate_record(id).await?;
        let removed = self.cache.invalidate_all_searches().await;
        debug!("Write to client {} invalidated {} search pages", id, removed);
        Ok(())
    }
}

/// Handler for GET /api/v1/clients/search
///
/// Serves the page from cache when present, otherwise queries the record
/// store and caches the result for the search TTL.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchPage>> {
    let (page, size) = params
        .page_and_size(state.limits)
        .map_err(AppError::InvalidRequest)?;
    let key = params.descriptor(state.limits).search_key();

    match state.cache.get_cached_search::<SearchPage>(&key).await {
        CacheLookup::Hit(result) => return Ok(Json(result)),
        CacheLookup::Miss => {}
        CacheLookup::StoreError(detail) => {
            debug!("Serving {} from record store after cache error: {}", key, detail);
        }
    }

    let (items, total) = state.records.search(&params.filter(), page, size).await?;
    let result = SearchPage::new(items, total, page, size);

    state
        .cache
        .put_cached_search(&key, &result, state.cache.search_ttl())
        .await;

    Ok(Json(result))
}

/// Handler for GET /api/v1/clients/:id
pub async fn get_client_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Client>> {
    if let CacheLookup::Hit(client) = state.cache.get_record::<Client>(id).await {
        return Ok(Json(client));
    }

    let client = state
        .records
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    state
        .cache
        .put_record(id, &client, state.cache.default_ttl())
        .await;

    Ok(Json(client))
}

/// Handler for POST /api/v1/clients
pub async fn create_client_handler(
    State(state): State<AppState>,
    Json(req): Json<ClientCreate>,
) -> Result<(StatusCode, Json<Client>)> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let client = state.records.create(req).await?;
    info!("Created client {}", client.id_cliente);

    state.invalidate_after_write(client.id_cliente).await?;

    Ok((StatusCode::CREATED, Json(client)))
}

/// Handler for PUT /api/v1/clients/:id
pub async fn update_client_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<ClientUpdate>,
) -> Result<Json<Client>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let client = state.records.update(id, req).await?;
    info!("Updated client {}", id);

    state.invalidate_after_write(id).await?;

    Ok(Json(client))
}

/// Handler for DELETE /api/v1/clients/:id
///
/// Soft delete: the record stays but is marked inactive.
pub async fn delete_client_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    state.records.soft_delete(id).await?;
    info!("Deactivated client {}", id);

    state.invalidate_after_write(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/v1/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.stats().await)
}

/// Handler for GET /health
///
/// Always 200; reports "degraded" while the cache backend is unreachable.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_cache_probe(state.cache.health_check().await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheSettings, MemoryBackend};
    use crate::records::InMemoryRecordStore;

    fn test_state() -> AppState {
        let cache = QueryCache::new(Arc::new(MemoryBackend::new()), CacheSettings::default());
        AppState::new(
            Arc::new(cache),
            Arc::new(InMemoryRecordStore::new()),
            PageLimits::default(),
        )
    }

    fn maria() -> ClientCreate {
        ClientCreate {
            cpf: "529.982.247-25".to_string(),
            nome_completo: "Maria Silva".to_string(),
            uf: Some("SP".to_string()),
            ativo: true,
            ..ClientCreate::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_get_handler() {
        let state = test_state();

        let (status, Json(created)) = create_client_handler(State(state.clone()), Json(maria()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(fetched) = get_client_handler(State(state.clone()), Path(created.id_cliente))
            .await
            .unwrap();
        assert_eq!(fetched, created);

        // Second read is served from cache
        get_client_handler(State(state.clone()), Path(created.id_cliente))
            .await
            .unwrap();
        assert_eq!(state.cache.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent_client() {
        let state = test_state();

        let result = get_client_handler(State(state), Path(42)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_handler_caches_page() {
        let state = test_state();
        create_client_handler(State(state.clone()), Json(maria()))
            .await
            .unwrap();

        let Json(first) = search_handler(State(state.clone()), Query(SearchParams::default()))
            .await
            .unwrap();
        assert_eq!(first.total, 1);

        let Json(second) = search_handler(State(state.clone()), Query(SearchParams::default()))
            .await
            .unwrap();
        assert_eq!(second, first);

        let stats = state.cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_search_handler_rejects_bad_size() {
        let state = test_state();
        let params = SearchParams {
            size: Some(500),
            ..SearchParams::default()
        };

        let result = search_handler(State(state), Query(params)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_create_invalid_request() {
        let state = test_state();
        let req = ClientCreate {
            cpf: "000.000.000-00".to_string(),
            ..maria()
        };

        let result = create_client_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(AppError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_handler_invalidates_record() {
        let state = test_state();
        let (_, Json(created)) = create_client_handler(State(state.clone()), Json(maria()))
            .await
            .unwrap();
        let id = created.id_cliente;

        // Warm the record cache
        get_client_handler(State(state.clone()), Path(id)).await.unwrap();

        let status = delete_client_handler(State(state.clone()), Path(id))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);

        let Json(after) = get_client_handler(State(state), Path(id)).await.unwrap();
        assert!(!after.ativo);
    }

    #[tokio::test]
    async fn test_update_missing_client() {
        let state = test_state();

        let result =
            update_client_handler(State(state), Path(7), Json(ClientUpdate::default())).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_health_handler() {
        let Json(response) = health_handler(State(test_state())).await;
        assert_eq!(response.status, "healthy");
    }
}
