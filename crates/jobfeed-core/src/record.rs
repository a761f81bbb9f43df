//! Entity records and the immutable [`Snapshot`] that groups them.
//!
//! A record's payload is carried as an opaque [`serde_json::Value`]; nothing
//! in the read path looks inside it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// One tracked job listing as last observed by the scraper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    /// Stable identifier of the listing.
    pub entity_id: String,
    /// Decoded listing payload, passed through untouched.
    pub payload: serde_json::Value,
    /// When the scraper last observed this listing.
    #[serde(serialize_with = "rfc3339::serialize")]
    pub last_observed_at: DateTime<Utc>,
}

/// An immutable, fully formed view of all tracked listings.
///
/// Records are ordered most recently observed first and `entity_id` is
/// unique within a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    records: Vec<EntityRecord>,
    generated_at: DateTime<Utc>,
}

impl Snapshot {
    /// Build a snapshot from records already in display order.
    ///
    /// If an `entity_id` appears more than once, the first occurrence wins
    /// and later duplicates are dropped.
    pub fn new(records: Vec<EntityRecord>, generated_at: DateTime<Utc>) -> Self {
        let total = records.len();
        let mut seen: HashSet<String> = HashSet::with_capacity(total);
        let records: Vec<EntityRecord> = records
            .into_iter()
            .filter(|record| seen.insert(record.entity_id.clone()))
            .collect();

        let dropped = total.saturating_sub(records.len());
        if dropped > 0 {
            tracing::warn!(dropped, "Dropped duplicate entity ids from snapshot");
        }

        Self {
            records,
            generated_at,
        }
    }

    /// An explicitly empty snapshot, generated now.
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// The records, most recently observed first.
    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// When the source finished reading this snapshot.
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Look up a record by its identifier.
    pub fn get(&self, entity_id: &str) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.entity_id == entity_id)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// RFC 3339 rendering with whole seconds and a `Z` suffix.
pub mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::Serializer;

    /// Format a UTC timestamp as `2025-01-02T03:04:05Z`.
    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// `serialize_with` adapter for [`format`].
    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }
}
