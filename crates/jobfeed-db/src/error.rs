//! Error types for the store adapter.
//!
//! [`DbError`] covers failures of the read as a whole; the caller keeps its
//! previous snapshot. [`DecodeError`] covers a single bad row, which is
//! dropped while the rest of the read continues.

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Why a single `job_entries` row could not become an entity record.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The `data` column was NULL.
    #[error("payload is missing")]
    MissingPayload,

    /// The `data` column did not contain valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The `last_visited_at` column was NULL.
    #[error("observation timestamp is missing")]
    MissingTimestamp,
}
