//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, create_client_handler, delete_client_handler, get_client_handler,
    health_handler, search_handler, update_client_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/v1/clients/search` - Filtered, paginated search
/// - `POST /api/v1/clients` - Create a client
/// - `GET /api/v1/clients/:id` - Client details
/// - `PUT /api/v1/clients/:id` - Update a client
/// - `DELETE /api/v1/clients/:id` - Soft delete a client
/// - `GET /api/v1/cache/stats` - Cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/clients", post(create_client_handler))
        .route("/api/v1/clients/search", get(search_handler))
        .route(
            "/api/v1/clients/:id",
            get(get_client_handler)
                .put(update_client_handler)
                .delete(delete_client_handler),
        )
        .route("/api/v1/cache/stats", get(cache_stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
