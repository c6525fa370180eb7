//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::AppState;
use super::types::ErrorResponse;
use crate::grid::{GridStatus, NodeSnapshot};

/// `GET /api/gridstatus` → 200 + `GridStatus` JSON
pub async fn get_grid_status(State(state): State<Arc<AppState>>) -> Json<GridStatus> {
    Json(state.grid.status(state.overload_threshold))
}

/// Returns one node's snapshot.
///
/// `GET /api/nodes/{id}` → 200 + `NodeSnapshot` JSON
/// `GET /api/nodes/UNKNOWN` → 404 + `ErrorResponse`
pub async fn get_node(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<NodeSnapshot>, (StatusCode, Json<ErrorResponse>)> {
    state
        .grid
        .node(&id)
        .map(|node| Json(NodeSnapshot::from(node)))
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: format!("node `{id}` not found"),
                }),
            )
        })
}
