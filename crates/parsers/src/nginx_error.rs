//! Nginx error log parser
//!
//! ```text
//! 2023/12/01 10:30:45 [error] 1234#0: *17 upstream timed out ...
//! ```
//!
//! The bracketed tag is the severity; pid/tid are discarded.

use chrono::Utc;
use loghud_model::{Level, LogRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::timefmt;
use crate::LineParser;

const FORMAT: &str = "nginx-error";

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}/\d{2}/\d{2} \d{2}:\d{2}:\d{2}) \[(\w+)\] (\d+)#(\d+): (.+)")
        .expect("nginx error regex")
});

pub struct NginxErrorParser;

impl LineParser for NginxErrorParser {
    fn parse(&self, line: &str) -> LogRecord {
        let Some(caps) = LINE_RE.captures(line) else {
            return LogRecord::new(Utc::now(), Level::Error, line, line, FORMAT);
        };

        let timestamp = timefmt::naive_as_utc(&caps[1], "%Y/%m/%d %H:%M:%S")
            .unwrap_or_else(Utc::now);

        LogRecord::new(timestamp, caps[2].to_string(), caps[5].to_string(), line, FORMAT)
    }

    fn format_id(&self) -> &'static str {
        FORMAT
    }
}

#[cfg(test)]
#[path = "nginx_error_test.rs"]
mod tests;
