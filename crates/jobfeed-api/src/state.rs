//! Shared application state for the query service.

use std::sync::Arc;

use jobfeed_core::SnapshotCache;

use crate::auth::ApiKey;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. Handlers
/// only ever read the cache; the refresh scheduler is its sole writer.
#[derive(Clone)]
pub struct AppState {
    /// The snapshot cache the API serves from.
    pub cache: Arc<SnapshotCache>,
    /// Credential every request must present.
    pub api_key: ApiKey,
}

impl AppState {
    /// Create application state serving `cache` behind `api_key`.
    pub const fn new(cache: Arc<SnapshotCache>, api_key: ApiKey) -> Self {
        Self { cache, api_key }
    }
}
