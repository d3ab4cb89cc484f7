//! PHP error log parser
//!
//! ```text
//! [01-Dec-2023 10:30:45 UTC] PHP Fatal error: oops in /srv/a.php on line 12
//! ```
//!
//! `extra` carries `file`, `line` and `type`; `error` holds
//! `"<type>: <message>"`.

use chrono::Utc;
use loghud_model::{Level, LogRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::timefmt;
use crate::LineParser;

const FORMAT: &str = "php-error";

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]]+)\] PHP ([^:]+): (.+) in (.+) on line (\d+)").expect("php error regex")
});

pub struct PhpErrorParser;

impl LineParser for PhpErrorParser {
    fn parse(&self, line: &str) -> LogRecord {
        let Some(caps) = LINE_RE.captures(line) else {
            let mut record =
                LogRecord::new(Utc::now(), type_level(line), line, line, FORMAT);
            record.error = Some(line.to_string());
            return record;
        };

        let timestamp = timefmt::php_datetime(&caps[1]).unwrap_or_else(Utc::now);
        let error_type = caps[2].to_string();
        let message = caps[3].to_string();
        let file = caps[4].to_string();
        let line_no = caps[5].to_string();

        let mut record = LogRecord::new(
            timestamp,
            type_level(&error_type),
            message.clone(),
            line,
            FORMAT,
        );
        record.error = Some(format!("{error_type}: {message}"));
        record.extra.insert("file".into(), Value::String(file));
        record.extra.insert("line".into(), Value::String(line_no));
        record.extra.insert("type".into(), Value::String(error_type));
        record
    }

    fn format_id(&self) -> &'static str {
        FORMAT
    }
}

/// Severity from the PHP error type (or a whole unmatched line)
fn type_level(text: &str) -> Level {
    let lower = text.to_lowercase();
    if lower.contains("warning") {
        Level::Warn
    } else if lower.contains("notice") {
        Level::Info
    } else {
        Level::Error
    }
}

#[cfg(test)]
#[path = "php_error_test.rs"]
mod tests;
