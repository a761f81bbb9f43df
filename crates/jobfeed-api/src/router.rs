//! Axum router construction for the query service.
//!
//! Assembles all routes into a single [`Router`] with API key
//! authentication in front of every route and HTTP tracing around it.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::auth;
use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness check
/// - `GET /jobs` -- current snapshot
///
/// Only `GET` is routed (Axum answers `HEAD` from the `GET` handler
/// without a body); other methods get a JSON `405`. Unknown paths get a
/// JSON `404`. Authentication wraps all of it.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/health",
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .route(
            "/jobs",
            get(handlers::list_jobs).fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_api_key,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
