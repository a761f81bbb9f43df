//! REST endpoint handlers for the query service.
//!
//! Handlers read from the [`SnapshotCache`](jobfeed_core::SnapshotCache)
//! via the shared [`AppState`]. Each request loads the current snapshot
//! exactly once and renders its response from that one snapshot.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness check |
//! | `GET` | `/jobs` | All jobs from the current snapshot |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Message returned by the health check.
pub const HEALTHY_MESSAGE: &str = "API is healthy";

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Static liveness response.
pub async fn health() -> Json<ApiResponse<'static>> {
    Json(ApiResponse::ok_message(HEALTHY_MESSAGE))
}

// ---------------------------------------------------------------------------
// GET /jobs
// ---------------------------------------------------------------------------

/// Return every record of the current snapshot with its count and the
/// time the snapshot was published.
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Response {
    let current = state.cache.current();
    let records = current.snapshot().records();
    Json(ApiResponse::records(records, &current.published_at())).into_response()
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

/// Any method other than `GET` on a known route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Any path without a route.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
