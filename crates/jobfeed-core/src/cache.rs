//! The shared "current snapshot" reference.
//!
//! [`SnapshotCache`] owns exactly one [`Published`] value behind an
//! [`ArcSwap`]. Readers load the `Arc` without taking any lock; the single
//! writer builds the next snapshot elsewhere and only swaps the pointer.
//! A reader holding an old `Arc` keeps that snapshot alive until it drops
//! it, so a response is always rendered from one complete snapshot.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

use crate::record::Snapshot;

/// A snapshot together with its publish metadata.
///
/// The metadata lives in the same allocation as the snapshot so a reader
/// can never pair one snapshot with another's `last_updated` time.
#[derive(Debug)]
pub struct Published {
    snapshot: Snapshot,
    version: u64,
    published_at: DateTime<Utc>,
}

impl Published {
    /// The published snapshot.
    pub const fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Publish counter. `0` is the empty snapshot the cache starts with.
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Wall-clock time at which this snapshot became current.
    pub const fn published_at(&self) -> DateTime<Utc> {
        self.published_at
    }
}

/// In-memory holder of the current snapshot.
///
/// Shared by `Arc` between the refresh scheduler (the only writer) and the
/// HTTP handlers (readers).
pub struct SnapshotCache {
    current: ArcSwap<Published>,
    publish_lock: Mutex<()>,
}

impl SnapshotCache {
    /// Create a cache holding an empty snapshot at version 0.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Published {
                snapshot: Snapshot::empty(),
                version: 0,
                published_at: Utc::now(),
            }),
            publish_lock: Mutex::new(()),
        }
    }

    /// The current snapshot. Never blocks.
    pub fn current(&self) -> Arc<Published> {
        self.current.load_full()
    }

    /// Make `snapshot` current and return the published value.
    ///
    /// Empty snapshots are published like any other. Concurrent callers are
    /// serialized so versions stay strictly increasing; readers are never
    /// affected by the lock.
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Published> {
        let _guard = self
            .publish_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let version = self.current.load().version.saturating_add(1);
        let published = Arc::new(Published {
            snapshot,
            version,
            published_at: Utc::now(),
        });
        self.current.store(Arc::clone(&published));
        published
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::record::EntityRecord;

    /// A snapshot whose records all carry the same `round` marker.
    fn snapshot_for_round(round: u64, size: usize) -> Snapshot {
        let records = (0..size)
            .map(|i| EntityRecord {
                entity_id: format!("job-{i}"),
                payload: serde_json::json!({ "round": round }),
                last_observed_at: Utc::now(),
            })
            .collect();
        Snapshot::new(records, Utc::now())
    }

    #[test]
    fn starts_empty_at_version_zero() {
        let cache = SnapshotCache::new();
        let current = cache.current();
        assert_eq!(current.version(), 0);
        assert!(current.snapshot().is_empty());
    }

    #[test]
    fn publish_replaces_current_and_bumps_version() {
        let cache = SnapshotCache::new();
        let published = cache.publish(snapshot_for_round(1, 3));
        assert_eq!(published.version(), 1);

        let current = cache.current();
        assert_eq!(current.version(), 1);
        assert_eq!(current.snapshot().len(), 3);

        cache.publish(snapshot_for_round(2, 1));
        assert_eq!(cache.current().version(), 2);
        assert_eq!(cache.current().snapshot().len(), 1);
    }

    #[test]
    fn current_is_idempotent_without_publish() {
        let cache = SnapshotCache::new();
        cache.publish(snapshot_for_round(7, 4));

        let first = cache.current();
        let second = cache.current();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.snapshot(), second.snapshot());
        assert_eq!(first.published_at(), second.published_at());
    }

    #[test]
    fn empty_publish_over_non_empty_is_allowed() {
        let cache = SnapshotCache::new();
        cache.publish(snapshot_for_round(1, 5));
        cache.publish(Snapshot::empty());

        let current = cache.current();
        assert_eq!(current.version(), 2);
        assert!(current.snapshot().is_empty());
    }

    #[test]
    fn held_reference_survives_publish() {
        let cache = SnapshotCache::new();
        cache.publish(snapshot_for_round(1, 2));
        let held = cache.current();

        cache.publish(snapshot_for_round(2, 6));

        assert_eq!(held.snapshot().len(), 2);
        assert_eq!(held.snapshot().records()[0].payload["round"], 1);
        assert_eq!(cache.current().snapshot().len(), 6);
    }

    #[test]
    fn readers_never_observe_a_mixed_snapshot() {
        const SIZE: usize = 50;
        const ROUNDS: u64 = 300;

        let cache = SnapshotCache::new();
        let done = AtomicBool::new(false);

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let mut last_version = 0;
                    while !done.load(Ordering::Acquire) {
                        let current = cache.current();
                        assert!(current.version() >= last_version);
                        last_version = current.version();

                        let records = current.snapshot().records();
                        if current.version() == 0 {
                            assert!(records.is_empty());
                            continue;
                        }
                        assert_eq!(records.len(), SIZE);
                        let round = &records[0].payload["round"];
                        assert!(records.iter().all(|r| &r.payload["round"] == round));
                    }
                });
            }

            for round in 1..=ROUNDS {
                cache.publish(snapshot_for_round(round, SIZE));
            }
            done.store(true, Ordering::Release);
        });

        assert_eq!(cache.current().version(), ROUNDS);
    }
}
