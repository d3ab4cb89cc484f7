//! Java application log parser (logback/log4j style)
//!
//! ```text
//! 2023-12-01 10:30:45.123 [INFO] com.example.Service - request handled
//! ```
//!
//! Either `.` or `,` is accepted as the millisecond separator. The logger
//! name lands in `extra.logger`; messages mentioning an exception are
//! mirrored into `error`.

use chrono::Utc;
use loghud_model::{Level, LogRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::timefmt;
use crate::LineParser;

const FORMAT: &str = "java-log";

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}[.,]\d{3}) \[([^\]]+)\] ([^-]+) - (.+)")
        .expect("java log regex")
});

pub struct JavaLogParser;

impl LineParser for JavaLogParser {
    fn parse(&self, line: &str) -> LogRecord {
        let Some(caps) = LINE_RE.captures(line) else {
            return LogRecord::new(Utc::now(), Level::scan(line), line, line, FORMAT);
        };

        // Normalize the comma millisecond separator before parsing
        let time_str = caps[1].replacen(',', ".", 1);
        let timestamp = timefmt::naive_as_utc(&time_str, "%Y-%m-%d %H:%M:%S%.3f")
            .unwrap_or_else(Utc::now);

        let level = caps[2].trim().to_lowercase();
        let logger = caps[3].trim().to_string();
        let message = caps[4].to_string();

        let mut record = LogRecord::new(timestamp, level, message.clone(), line, FORMAT);
        record.extra.insert("logger".into(), Value::String(logger));

        if message.contains("Exception") || message.contains("Error") {
            record.error = Some(message);
        }

        record
    }

    fn format_id(&self) -> &'static str {
        FORMAT
    }
}

#[cfg(test)]
#[path = "java_log_test.rs"]
mod tests;
