//! Read-only REST API over live grid state.
//!
//! Provides two GET endpoints:
//! - `/api/gridstatus` aggregate status plus every node
//! - `/api/nodes/{id}` one node's snapshot, 404 if unknown

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::grid::Grid;

pub use types::ErrorResponse;

/// State shared across request handlers.
///
/// Handlers only read nodes, each through its own lock, so the server runs
/// alongside the engine's jobs without extra coordination.
pub struct AppState {
    /// Live grid, shared with the engine.
    pub grid: Arc<Grid>,
    /// Utilization (%) above which a node counts as overloaded.
    pub overload_threshold: f64,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/gridstatus", get(handlers::get_grid_status))
        .route("/api/nodes/{id}", get(handlers::get_node))
        .with_state(state)
}

/// Binds to `addr` and serves the API until the task is dropped.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, router(state)).await
}
