//! Error types for the job feed binary.
//!
//! Everything here is a startup failure: once the server is serving, store
//! and request errors are handled where they happen and never end the
//! process.

use jobfeed_api::ServerError;
use jobfeed_db::DbError;

/// Errors that terminate the process.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The store handle could not be created.
    #[error("store setup error: {0}")]
    Store(#[from] DbError),

    /// The HTTP server failed to bind or serve.
    #[error("server error: {0}")]
    Server(#[from] ServerError),
}
