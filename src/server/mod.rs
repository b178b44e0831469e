//! Read-only HTTP API over the stored posts
//!
//! Routes:
//! - `GET /api/posts?limit=10&page=1` - one page of posts, newest first
//! - `GET /health` - liveness probe
//!
//! Crawl-time problems are never surfaced here; only storage failures are.

mod routes;

pub use routes::{list_posts, PostsPage, PostsQuery, DEFAULT_LIMIT, DEFAULT_PAGE};

use crate::storage::SharedStorage;
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// State shared by all handlers
pub struct AppState {
    pub storage: SharedStorage,
}

/// Builds the API router
///
/// Any origin may read; the web client is served from a different port.
pub fn build_router(storage: SharedStorage) -> Router {
    let state = Arc::new(AppState { storage });

    Router::new()
        .route("/api/posts", get(routes::list_posts))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
}

/// Serves the API on `addr` until `shutdown` resolves
pub async fn serve<F>(addr: &str, storage: SharedStorage, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Read API listening on {}", listener.local_addr()?);

    axum::serve(listener, build_router(storage))
        .with_graceful_shutdown(shutdown)
        .await
}
