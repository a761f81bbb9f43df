//! The single JSON envelope shared by every response.
//!
//! ```json
//! {"success": true, "data": [...], "count": 2, "last_updated": "2025-01-02T03:04:05Z"}
//! {"success": false, "message": "Method not allowed"}
//! ```
//!
//! Absent fields are omitted, so clients can parse one schema for both
//! success and failure.

use chrono::{DateTime, Utc};
use jobfeed_core::EntityRecord;
use jobfeed_core::record::rfc3339;
use serde::Serialize;

/// Response envelope `{success, data?, count?, last_updated?, message?}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<'a> {
    /// Whether the request was served.
    pub success: bool,
    /// Records of the snapshot the request was served from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a [EntityRecord]>,
    /// Number of records in `data`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// When the served snapshot was published, RFC 3339.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    /// Human-readable status or error text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

impl<'a> ApiResponse<'a> {
    /// A successful response carrying only a message.
    pub const fn ok_message(message: &'a str) -> Self {
        Self {
            success: true,
            data: None,
            count: None,
            last_updated: None,
            message: Some(message),
        }
    }

    /// A failed response carrying only a message.
    pub const fn failure(message: &'a str) -> Self {
        Self {
            success: false,
            data: None,
            count: None,
            last_updated: None,
            message: Some(message),
        }
    }

    /// A successful listing of `records`.
    pub fn records(records: &'a [EntityRecord], last_updated: &DateTime<Utc>) -> Self {
        Self {
            success: true,
            data: Some(records),
            count: Some(records.len()),
            last_updated: Some(rfc3339::format(last_updated)),
            message: None,
        }
    }
}
