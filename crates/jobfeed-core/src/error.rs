//! Error types for the refresh cycle.
//!
//! A [`RefreshError`] never reaches an HTTP client. The scheduler logs it
//! and keeps serving the previous snapshot.

use std::time::Duration;

/// Errors that can occur during a single refresh tick.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// The snapshot source failed to read from the store.
    #[error("store read failed: {0}")]
    Store(String),

    /// The snapshot source did not answer within the refresh deadline.
    #[error("store read exceeded deadline of {0:?}")]
    Timeout(Duration),
}
