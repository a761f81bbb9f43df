//! Store adapter for the job feed (`PostgreSQL`).
//!
//! An external scraper writes job listings into the `job_entries` table.
//! This crate reads the `'latest'` row of every job and decodes it into a
//! [`jobfeed_core::Snapshot`]. It never writes to the table.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`job_store`] -- latest-entry query, per-row decoding, and the
//!   [`jobfeed_core::SnapshotSource`] implementation
//! - [`error`] -- Shared error types

pub mod error;
pub mod job_store;
pub mod postgres;

// Re-export primary types for convenience.
pub use error::{DbError, DecodeError};
pub use job_store::{JobEntryRow, JobStore, snapshot_from_rows};
pub use postgres::{PostgresConfig, PostgresPool};
