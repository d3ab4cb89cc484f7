//! Nginx combined access log parser
//!
//! Matches the stock `combined` log_format:
//!
//! ```text
//! $remote_addr - $remote_user [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"
//! ```

use chrono::Utc;
use loghud_model::{Level, LogRecord};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::timefmt;
use crate::LineParser;

const FORMAT: &str = "nginx-access";

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^(\S+) - (\S+) \[([^\]]+)\] "([^"]*)" (\d+) (\d+) "([^"]*)" "([^"]*)""#)
        .expect("nginx access regex")
});

pub struct NginxAccessParser;

impl LineParser for NginxAccessParser {
    fn parse(&self, line: &str) -> LogRecord {
        let Some(caps) = LINE_RE.captures(line) else {
            return LogRecord::new(Utc::now(), Level::Info, line, line, FORMAT);
        };

        let remote_ip = &caps[1];
        let time_str = &caps[3];
        let request = &caps[4];
        let status: i64 = caps[5].parse().unwrap_or(0);
        let size: i64 = caps[6].parse().unwrap_or(0);
        let referrer = &caps[7];
        let user_agent = &caps[8];

        let timestamp = timefmt::with_offset(time_str, "%d/%b/%Y:%H:%M:%S %z")
            .unwrap_or_else(Utc::now);

        // "$request" is "METHOD URL PROTO"; proto is dropped
        let mut parts = request.splitn(3, ' ');
        let method = parts.next().unwrap_or("").to_string();
        let url = parts.next().unwrap_or("").to_string();

        let mut record = LogRecord::new(
            timestamp,
            status_level(status),
            format!("{method} {url} {status}"),
            line,
            FORMAT,
        );
        record.remote_ip = Some(remote_ip.to_string());
        record.method = Some(method);
        record.url = Some(url);
        record.status_code = Some(status);
        record.size = Some(size);
        record.referrer = Some(referrer.to_string());
        record.user_agent = Some(user_agent.to_string());
        record
    }

    fn format_id(&self) -> &'static str {
        FORMAT
    }
}

/// Map an HTTP status to a severity
fn status_level(status: i64) -> Level {
    if status >= 500 {
        Level::Error
    } else if status >= 400 {
        Level::Warn
    } else {
        Level::Info
    }
}

#[cfg(test)]
#[path = "nginx_access_test.rs"]
mod tests;
