//! JSON Lines parser
//!
//! Handles two shapes of input:
//!
//! 1. Objects matching the record schema decode directly.
//! 2. Any other JSON object goes through a generic path: `message`,
//!    `level` and `timestamp` are lifted when present, and the whole
//!    object is preserved under `extra` so nothing is lost.
//!
//! Non-JSON lines fall back to a record with level `unknown`.

use chrono::{DateTime, Utc};
use loghud_model::{Level, LogRecord};
use serde_json::{Map, Value};

use crate::LineParser;

const FORMAT: &str = "jsonlines";

pub struct JsonLinesParser;

impl LineParser for JsonLinesParser {
    fn parse(&self, line: &str) -> LogRecord {
        // Schema-shaped objects take the fast path.
        if let Ok(mut record) = serde_json::from_str::<LogRecord>(line) {
            if record.original_log.is_empty() {
                record.original_log = line.to_string();
            }
            if record.source.is_empty() {
                record.source = FORMAT.to_string();
            }
            return record;
        }

        match serde_json::from_str::<Map<String, Value>>(line) {
            Ok(object) => generic_record(line, object),
            Err(_) => LogRecord::new(Utc::now(), Level::Unknown, line, line, FORMAT),
        }
    }

    fn format_id(&self) -> &'static str {
        FORMAT
    }
}

/// Lift well-known fields out of an arbitrary JSON object.
fn generic_record(line: &str, object: Map<String, Value>) -> LogRecord {
    let mut record = LogRecord::new(Utc::now(), Level::Unknown, "", line, FORMAT);

    if let Some(Value::String(message)) = object.get("message") {
        record.message = message.clone();
    }
    if let Some(Value::String(level)) = object.get("level") {
        record.level = level.clone();
    }
    if let Some(Value::String(ts)) = object.get("timestamp") {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(ts) {
            record.timestamp = parsed.with_timezone(&Utc);
        }
    }

    record.extra = object;
    record
}

#[cfg(test)]
#[path = "jsonlines_test.rs"]
mod tests;
