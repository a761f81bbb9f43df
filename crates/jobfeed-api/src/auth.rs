//! Shared-secret authentication.
//!
//! Every route, including the not-found fallback, sits behind
//! [`require_api_key`]. The check runs before routing decides on the
//! method, so an unauthenticated `POST` gets `401`, not `405`.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

/// Request header carrying the credential.
pub const API_KEY_HEADER: &str = "x-api-key";

/// The static shared secret clients must present.
#[derive(Clone)]
pub struct ApiKey(Arc<str>);

impl ApiKey {
    /// Wrap a pre-validated secret.
    pub fn new(secret: &str) -> Self {
        Self(Arc::from(secret))
    }

    /// Compare a presented header value against the secret.
    ///
    /// Runs over the full length regardless of where the first mismatch is.
    pub fn matches(&self, presented: &[u8]) -> bool {
        let expected = self.0.as_bytes();
        if presented.len() != expected.len() {
            return false;
        }
        presented
            .iter()
            .zip(expected)
            .fold(0_u8, |diff, (a, b)| diff | (a ^ b))
            == 0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Reject requests whose `X-API-KEY` header is missing or wrong.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorized = request
        .headers()
        .get(API_KEY_HEADER)
        .is_some_and(|value| state.api_key.matches(value.as_bytes()));

    if !authorized {
        debug!(
            method = %request.method(),
            path = request.uri().path(),
            "Rejected request without a valid API key"
        );
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
