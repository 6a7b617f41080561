//! HTTP facade for the geofleet driver registry.
//!
//! JSON over HTTP/1.1. Wrong-method requests get 405 from the router;
//! malformed bodies get 400 from the JSON extractor; everything else is
//! mapped in [`handlers::ApiError`].

use axum::routing::{get, post, put};
use axum::Router;
use geofleet::DriverManager;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

pub mod handlers;
pub mod protocol;

/// Build the application router over a shared manager.
pub fn router(manager: Arc<DriverManager>) -> Router {
    Router::new()
        .route("/drivers", post(handlers::add_driver))
        .route("/drivers/location", put(handlers::update_location))
        .route("/drivers/status", put(handlers::update_status))
        .route("/drivers/search", post(handlers::search_drivers))
        .route("/drivers/compare", post(handlers::compare_indexes))
        .route("/stats", get(handlers::get_stats))
        .route("/health", get(handlers::health))
        .with_state(manager)
}

/// Serve the registry until the shutdown future resolves.
pub async fn run_server(
    addr: SocketAddr,
    manager: Arc<DriverManager>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("geofleet HTTP server listening on {}", addr);

    axum::serve(listener, router(manager))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
