//! Periodic refresh of the snapshot cache.
//!
//! [`Refresher`] pulls a fresh [`Snapshot`] from a [`SnapshotSource`] on a
//! fixed interval and publishes it to the [`SnapshotCache`]. The loop is
//! the only writer, so refreshes are strictly serialized by the timer and
//! never triggered by readers.
//!
//! A failed or timed-out tick leaves the cache untouched and the loop
//! carries on with the next tick. The loop stops when its
//! [`CancellationToken`] is cancelled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::SnapshotCache;
use crate::error::RefreshError;
use crate::record::Snapshot;

/// Default time between refresh ticks.
const DEFAULT_INTERVAL_MS: u64 = 500;

/// Default deadline for a single store read.
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default time between cache status log lines.
const DEFAULT_STATUS_INTERVAL_SECS: u64 = 30;

/// Lower bound applied to every timer period.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Something that can produce the latest snapshot of the store.
pub trait SnapshotSource: Send + Sync + 'static {
    /// Error returned when the underlying read fails.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read and decode the latest state of every tracked entity.
    fn load_latest(&self) -> impl Future<Output = Result<Snapshot, Self::Error>> + Send;
}

/// Timing configuration for the refresh loop.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between refresh ticks.
    pub interval: Duration,
    /// Deadline for one `load_latest` call.
    pub timeout: Duration,
    /// Time between cache status log lines.
    pub status_interval: Duration,
}

impl RefreshConfig {
    /// Set the refresh interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the store read deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the status log interval.
    #[must_use]
    pub const fn with_status_interval(mut self, status_interval: Duration) -> Self {
        self.status_interval = status_interval;
        self
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            status_interval: Duration::from_secs(DEFAULT_STATUS_INTERVAL_SECS),
        }
    }
}

/// Result of a successful refresh tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Version assigned to the newly published snapshot.
    pub version: u64,
    /// Number of records in the new snapshot.
    pub count: usize,
    /// Number of records in the snapshot it replaced.
    pub previous_count: usize,
}

/// Drives `load_latest` → `publish` on a fixed cadence.
pub struct Refresher<S> {
    source: S,
    cache: Arc<SnapshotCache>,
    config: RefreshConfig,
}

impl<S: SnapshotSource> Refresher<S> {
    /// Create a refresher that publishes into `cache`.
    pub const fn new(source: S, cache: Arc<SnapshotCache>, config: RefreshConfig) -> Self {
        Self {
            source,
            cache,
            config,
        }
    }

    /// The cache this refresher publishes into.
    pub const fn cache(&self) -> &Arc<SnapshotCache> {
        &self.cache
    }

    /// Run a single refresh tick.
    ///
    /// The store read is bounded by [`RefreshConfig::timeout`]. On any
    /// failure the current snapshot is left exactly as it was.
    pub async fn refresh_once(&self) -> Result<RefreshOutcome, RefreshError> {
        let snapshot =
            match tokio::time::timeout(self.config.timeout, self.source.load_latest()).await {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(e)) => return Err(RefreshError::Store(e.to_string())),
                Err(_elapsed) => return Err(RefreshError::Timeout(self.config.timeout)),
            };

        let previous_count = self.cache.current().snapshot().len();
        let count = snapshot.len();
        let published = self.cache.publish(snapshot);
        let version = published.version();

        if count == previous_count {
            debug!(count, version, "Snapshot refreshed (no change in size)");
        } else {
            info!(count, previous_count, version, "Snapshot updated");
        }

        Ok(RefreshOutcome {
            version,
            count,
            previous_count,
        })
    }

    /// Run the refresh loop until `cancel` fires.
    ///
    /// The first refresh tick happens one interval after the call; startup
    /// code is expected to have called [`Refresher::refresh_once`] already.
    pub async fn run(self, cancel: CancellationToken) {
        let mut refresh_timer = interval(self.config.interval.max(MIN_PERIOD));
        refresh_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut status_timer = interval(self.config.status_interval.max(MIN_PERIOD));
        status_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Both timers fire immediately on their first tick.
        refresh_timer.tick().await;
        status_timer.tick().await;

        info!(
            interval_ms = self.config.interval.as_millis(),
            timeout_ms = self.config.timeout.as_millis(),
            status_interval_secs = self.config.status_interval.as_secs(),
            "Refresh scheduler started"
        );

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("Refresh scheduler received shutdown signal");
                    break;
                }
                _ = refresh_timer.tick() => {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {
                            info!("Refresh scheduler cancelled during a store read");
                            break;
                        }
                        result = self.refresh_once() => {
                            if let Err(e) = result {
                                warn!(error = %e, "Snapshot refresh failed, keeping previous snapshot");
                            }
                        }
                    }
                }
                _ = status_timer.tick() => self.log_status(),
            }
        }

        info!("Refresh scheduler stopped");
    }

    fn log_status(&self) {
        let current = self.cache.current();
        let age = Utc::now().signed_duration_since(current.published_at());
        info!(
            count = current.snapshot().len(),
            version = current.version(),
            age_secs = age.num_seconds(),
            "Cache status"
        );
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::record::EntityRecord;

    #[derive(Debug, thiserror::Error)]
    #[error("connection refused")]
    struct FakeStoreError;

    /// Returns scripted results in order, failing once the script runs out.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Snapshot, FakeStoreError>>>,
        delay: Duration,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Snapshot, FakeStoreError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    impl SnapshotSource for ScriptedSource {
        type Error = FakeStoreError;

        async fn load_latest(&self) -> Result<Snapshot, Self::Error> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or(Err(FakeStoreError))
        }
    }

    fn snapshot_of(ids: &[&str]) -> Snapshot {
        let records = ids
            .iter()
            .map(|id| EntityRecord {
                entity_id: (*id).to_owned(),
                payload: serde_json::json!({ "id": id }),
                last_observed_at: Utc::now(),
            })
            .collect();
        Snapshot::new(records, Utc::now())
    }

    fn refresher(source: ScriptedSource) -> Refresher<ScriptedSource> {
        Refresher::new(
            source,
            Arc::new(SnapshotCache::new()),
            RefreshConfig::default()
                .with_interval(Duration::from_millis(500))
                .with_timeout(Duration::from_secs(1)),
        )
    }

    #[tokio::test]
    async fn successful_tick_publishes() {
        let refresher = refresher(ScriptedSource::new(vec![Ok(snapshot_of(&["job-1", "job-2"]))]));

        let outcome = refresher.refresh_once().await.unwrap();

        assert_eq!(
            outcome,
            RefreshOutcome {
                version: 1,
                count: 2,
                previous_count: 0
            }
        );
        let current = refresher.cache().current();
        assert_eq!(current.snapshot().len(), 2);
        assert!(current.snapshot().get("job-1").is_some());
    }

    #[tokio::test]
    async fn failed_tick_keeps_previous_snapshot() {
        let refresher = refresher(ScriptedSource::new(vec![
            Ok(snapshot_of(&["job-1"])),
            Err(FakeStoreError),
        ]));

        refresher.refresh_once().await.unwrap();
        let before = refresher.cache().current();

        let err = refresher.refresh_once().await.unwrap_err();
        assert!(matches!(err, RefreshError::Store(ref msg) if msg == "connection refused"));

        let after = refresher.cache().current();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.version(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_store_read_times_out() {
        let source = ScriptedSource::new(vec![Ok(snapshot_of(&["job-1"]))])
            .with_delay(Duration::from_secs(10));
        let refresher = refresher(source);

        let err = refresher.refresh_once().await.unwrap_err();

        assert!(matches!(err, RefreshError::Timeout(d) if d == Duration::from_secs(1)));
        assert_eq!(refresher.cache().current().version(), 0);
    }

    #[tokio::test]
    async fn empty_store_publishes_empty_snapshot() {
        let refresher = refresher(ScriptedSource::new(vec![
            Ok(snapshot_of(&["job-1"])),
            Ok(Snapshot::empty()),
        ]));

        refresher.refresh_once().await.unwrap();
        let outcome = refresher.refresh_once().await.unwrap();

        assert_eq!(outcome.count, 0);
        assert_eq!(outcome.previous_count, 1);
        assert!(refresher.cache().current().snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_failed_tick_and_stops_on_cancel() {
        let refresher = refresher(ScriptedSource::new(vec![
            Err(FakeStoreError),
            Ok(snapshot_of(&["job-1", "job-2", "job-3"])),
        ]));
        let cache = Arc::clone(refresher.cache());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(refresher.run(cancel.clone()));

        // Ticks at 500ms (fails) and 1000ms (succeeds).
        tokio::time::sleep(Duration::from_millis(1100)).await;

        let current = cache.current();
        assert_eq!(current.version(), 1);
        assert_eq!(current.snapshot().len(), 3);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_in_flight_read() {
        let source = ScriptedSource::new(vec![Ok(snapshot_of(&["job-1"]))])
            .with_delay(Duration::from_millis(800));
        let refresher = Refresher::new(
            source,
            Arc::new(SnapshotCache::new()),
            RefreshConfig::default()
                .with_interval(Duration::from_millis(100))
                .with_timeout(Duration::from_secs(5)),
        );
        let cache = Arc::clone(refresher.cache());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(refresher.run(cancel.clone()));

        // First tick at 100ms starts a read that would finish at 900ms.
        tokio::time::sleep(Duration::from_millis(300)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(cache.current().version(), 0);
    }
}
