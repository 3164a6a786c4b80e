//! Clients Cache - customer record API with a search result cache
//!
//! Searches are cached under a key derived from their filters; every write
//! invalidates the affected record and all cached searches.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clients_cache::api::create_router;
use clients_cache::cache::{CacheBackend, MemoryBackend, QueryCache, RedisBackend};
use clients_cache::records::InMemoryRecordStore;
use clients_cache::{spawn_cleanup_task, AppState, Config};

/// Startup allows this many cache round trips for the Redis handshake.
const REDIS_CONNECT_ROUND_TRIPS: u32 = 8;

/// Main entry point for the clients API server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Connect the cache backend (Redis, or in-process when unset/unreachable)
/// 4. Start the TTL sweep for the in-process backend
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clients_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clients API server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: port={}, cache_ttl={}s, search_ttl={}s, page_size={}/{}",
        config.server_port,
        config.default_ttl,
        config.search_ttl,
        config.default_page_size,
        config.max_page_size
    );

    let (backend, sweep) = connect_backend(&config).await;
    let cache = Arc::new(QueryCache::new(backend, config.cache_settings()));

    if cache.health_check().await {
        info!("Cache backend reachable");
    } else {
        warn!("Cache backend unreachable, serving from record store only");
    }

    let cleanup_handle = sweep.map(|memory| spawn_cleanup_task(memory, config.cleanup_interval));

    let state = AppState::from_config(&config, cache, Arc::new(InMemoryRecordStore::new()));
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Picks the cache backend.
///
/// Returns the in-process backend a second time when it is in use, so the
/// caller can run its sweep.
async fn connect_backend(config: &Config) -> (Arc<dyn CacheBackend>, Option<Arc<MemoryBackend>>) {
    if let Some(url) = config.redis_url.as_deref() {
        let limit = config.cache_settings().operation_timeout * REDIS_CONNECT_ROUND_TRIPS;
        match RedisBackend::connect_within(url, limit).await {
            Ok(redis) => return (Arc::new(redis), None),
            Err(err) => warn!("Redis unavailable ({}), using in-process cache", err),
        }
    }

    let memory = Arc::new(MemoryBackend::new());
    let backend: Arc<dyn CacheBackend> = memory.clone();
    info!("Using in-process cache backend");
    (backend, Some(memory))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
