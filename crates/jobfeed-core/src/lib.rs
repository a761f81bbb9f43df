//! Refreshing snapshot cache for the job feed.
//!
//! Job listings are written to `PostgreSQL` by an external scraper. This
//! crate holds the in-memory side of the read path:
//!
//! - [`record`] -- [`EntityRecord`] and the immutable [`Snapshot`]
//! - [`cache`] -- [`SnapshotCache`], the single atomically swapped
//!   "current snapshot" reference
//! - [`refresh`] -- [`SnapshotSource`] and the cancellable [`Refresher`]
//!   loop that pulls from the store on a fixed cadence
//! - [`error`] -- refresh failures
//!
//! # Architecture
//!
//! ```text
//! Refresher (timer) --> SnapshotSource::load_latest --> SnapshotCache::publish
//!                                                             ^
//!                                  HTTP handlers --> SnapshotCache::current
//! ```
//!
//! Snapshots are built entirely outside the cache and only the `Arc`
//! pointer is swapped, so readers never wait on the store and never see a
//! half-built collection.

pub mod cache;
pub mod error;
pub mod record;
pub mod refresh;

// Re-export primary types for convenience.
pub use cache::{Published, SnapshotCache};
pub use error::RefreshError;
pub use record::{EntityRecord, Snapshot};
pub use refresh::{RefreshConfig, RefreshOutcome, Refresher, SnapshotSource};
