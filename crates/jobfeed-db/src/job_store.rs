//! Reads the latest state of every job from the `job_entries` table.
//!
//! The scraper keeps one `entry_type = 'latest'` row per job next to its
//! history rows. [`JobStore::load_latest`] turns those rows into a
//! [`Snapshot`], dropping any row whose payload cannot be decoded so one bad
//! record never costs the whole refresh.

use chrono::{NaiveDateTime, Utc};
use jobfeed_core::{EntityRecord, Snapshot, SnapshotSource};
use sqlx::PgPool;

use crate::error::{DbError, DecodeError};
use crate::postgres::PostgresPool;

/// Latest row per job, newest observation first.
///
/// `data` is read as text so decoding stays per-row: a JSON error in one
/// row must not fail the query.
const LATEST_ENTRIES_QUERY: &str = r"
    SELECT job_id,
           data::text AS data,
           last_visited_at::timestamp AS last_visited_at
    FROM job_entries
    WHERE entry_type = 'latest'
    ORDER BY last_visited_at DESC NULLS LAST";

/// A raw `'latest'` row from the `job_entries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobEntryRow {
    /// Job identifier.
    pub job_id: String,
    /// Serialized JSON payload written by the scraper.
    pub data: Option<String>,
    /// When the scraper last visited the job, in UTC.
    pub last_visited_at: Option<NaiveDateTime>,
}

impl JobEntryRow {
    /// Decode this row into an [`EntityRecord`].
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if the payload is missing or not valid
    /// JSON, or if the timestamp is missing.
    pub fn decode(self) -> Result<EntityRecord, DecodeError> {
        let raw = self.data.ok_or(DecodeError::MissingPayload)?;
        let last_visited_at = self.last_visited_at.ok_or(DecodeError::MissingTimestamp)?;
        let payload: serde_json::Value = serde_json::from_str(&raw)?;

        Ok(EntityRecord {
            entity_id: self.job_id,
            payload,
            last_observed_at: last_visited_at.and_utc(),
        })
    }
}

/// Decode rows into a snapshot, skipping rows that fail to decode.
///
/// Row order is preserved.
pub fn snapshot_from_rows(rows: Vec<JobEntryRow>) -> Snapshot {
    let total = rows.len();
    let mut records = Vec::with_capacity(total);

    for row in rows {
        let job_id = row.job_id.clone();
        match row.decode() {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(%job_id, error = %e, "Skipping undecodable job entry"),
        }
    }

    let skipped = total.saturating_sub(records.len());
    tracing::debug!(rows = total, skipped, "Decoded latest job entries");

    Snapshot::new(records, Utc::now())
}

/// Read-only view of the `job_entries` table.
#[derive(Clone)]
pub struct JobStore {
    pool: PostgresPool,
}

impl JobStore {
    /// Create a job store bound to a connection pool.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }

    /// Fetch the raw `'latest'` rows, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query fails.
    pub async fn fetch_latest_rows(&self) -> Result<Vec<JobEntryRow>, DbError> {
        let rows = sqlx::query_as::<_, JobEntryRow>(LATEST_ENTRIES_QUERY)
            .fetch_all(self.pg())
            .await?;
        Ok(rows)
    }

    /// Read and decode the latest state of every job.
    ///
    /// No retries are attempted here; the refresh scheduler decides when to
    /// try again.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Postgres`] if the query itself fails.
    pub async fn load_latest(&self) -> Result<Snapshot, DbError> {
        let rows = self.fetch_latest_rows().await?;
        Ok(snapshot_from_rows(rows))
    }

    const fn pg(&self) -> &PgPool {
        self.pool.pool()
    }
}

impl SnapshotSource for JobStore {
    type Error = DbError;

    async fn load_latest(&self) -> Result<Snapshot, Self::Error> {
        Self::load_latest(self).await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use chrono::NaiveDate;

    use super::*;

    fn visited(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 14)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn row(job_id: &str, data: Option<&str>, hour: Option<u32>) -> JobEntryRow {
        JobEntryRow {
            job_id: job_id.to_owned(),
            data: data.map(str::to_owned),
            last_visited_at: hour.map(visited),
        }
    }

    #[test]
    fn decodes_payload_and_timestamp() {
        let record = row("job-1", Some(r#"{"title":"Rust dev","budget":500}"#), Some(9))
            .decode()
            .unwrap();

        assert_eq!(record.entity_id, "job-1");
        assert_eq!(record.payload["title"], "Rust dev");
        assert_eq!(record.payload["budget"], 500);
        assert_eq!(record.last_observed_at, visited(9).and_utc());
    }

    #[test]
    fn malformed_payload_is_a_decode_error() {
        let err = row("job-3", Some("{not json"), Some(9)).decode().unwrap_err();
        assert!(matches!(err, DecodeError::InvalidPayload(_)));
    }

    #[test]
    fn null_columns_are_decode_errors() {
        let err = row("job-4", None, Some(9)).decode().unwrap_err();
        assert!(matches!(err, DecodeError::MissingPayload));

        let err = row("job-5", Some("{}"), None).decode().unwrap_err();
        assert!(matches!(err, DecodeError::MissingTimestamp));
    }

    #[test]
    fn bad_rows_are_skipped_and_order_kept() {
        let snapshot = snapshot_from_rows(vec![
            row("job-1", Some(r#"{"n":1}"#), Some(12)),
            row("job-3", Some("<html>"), Some(11)),
            row("job-2", Some(r#"{"n":2}"#), Some(10)),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.records()[0].entity_id, "job-1");
        assert_eq!(snapshot.records()[1].entity_id, "job-2");
        assert!(snapshot.get("job-3").is_none());
    }

    #[test]
    fn no_rows_is_an_empty_snapshot() {
        let snapshot = snapshot_from_rows(Vec::new());
        assert!(snapshot.is_empty());
    }

    #[test]
    fn non_object_json_is_accepted_as_payload() {
        let record = row("job-6", Some("[1,2,3]"), Some(8)).decode().unwrap();
        assert_eq!(record.payload, serde_json::json!([1, 2, 3]));
    }
}
