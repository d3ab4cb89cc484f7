//! The normalized log record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A normalized log record
///
/// Produced by the line parsers, POSTed as the JSON publish body by the
/// agent dispatcher. `timestamp`, `level`, `message`, `original_log` and
/// `source` are always present; everything else is omitted when empty.
///
/// Numeric conventions: `status_code` and `size` are 64-bit integers,
/// `duration` is a 64-bit float (seconds).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LogRecord {
    /// Event time; ingest wall clock when the line carried no parseable time
    pub timestamp: DateTime<Utc>,

    /// Lower-case severity (`debug|info|warn|error|unknown`)
    #[serde(default)]
    pub level: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,

    /// Response body size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,

    /// Request duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// Open key→value map for format-specific fields
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,

    /// The verbatim input line, without trailing newline
    pub original_log: String,

    /// Identifier of the parser format that produced this record
    pub source: String,
}

impl LogRecord {
    /// Create a record with only the always-present fields filled in.
    ///
    /// Parsers start from this and set whatever their format matched.
    pub fn new(
        timestamp: DateTime<Utc>,
        level: impl Into<String>,
        message: impl Into<String>,
        original_log: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            level: level.into(),
            message: message.into(),
            host: None,
            remote_ip: None,
            method: None,
            url: None,
            status_code: None,
            user_agent: None,
            referrer: None,
            size: None,
            duration: None,
            error: None,
            stack: None,
            extra: Map::new(),
            original_log: original_log.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;
