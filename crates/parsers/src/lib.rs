//! LogHUD Parsers - Map raw log lines to normalized records
//!
//! A parser turns one raw line into a `LogRecord` for its declared
//! format. Parsing is infallible by contract: a line that does not match
//! the format still yields a record (ingest wall-clock timestamp, level
//! derived per format, `message` = the raw line), so a malformed line can
//! never stall the tailing pipeline.
//!
//! # Formats
//!
//! The recognized set is closed:
//!
//! - `jsonlines` - one JSON object per line
//! - `nginx-access` - nginx combined access log
//! - `nginx-error` - nginx error log
//! - `java-log` - logback/log4j style application logs
//! - `php-error` - PHP error log
//!
//! # Example
//!
//! ```
//! use loghud_parsers::{parser_for, LineParser};
//!
//! let parser = parser_for("nginx-access").unwrap();
//! let record = parser.parse(r#"192.0.2.1 - - [10/Oct/2023:13:55:36 +0000] "GET /a HTTP/1.1" 200 512 "-" "curl/8""#);
//! assert_eq!(record.status_code, Some(200));
//! assert_eq!(record.source, "nginx-access");
//! ```

mod java_log;
mod jsonlines;
mod nginx_access;
mod nginx_error;
mod php_error;
mod timefmt;

pub use java_log::JavaLogParser;
pub use jsonlines::JsonLinesParser;
pub use nginx_access::NginxAccessParser;
pub use nginx_error::NginxErrorParser;
pub use php_error::PhpErrorParser;

use loghud_model::LogRecord;

/// The format identifiers accepted by the factory
pub const KNOWN_FORMATS: &[&str] = &[
    "jsonlines",
    "nginx-access",
    "nginx-error",
    "java-log",
    "php-error",
];

/// A line parser for one log format
///
/// Implementations never fail: unmatched input produces a fallback
/// record carrying the raw line.
pub trait LineParser: Send + Sync {
    /// Parse one line (no trailing newline) into a record
    fn parse(&self, line: &str) -> LogRecord;

    /// The format identifier this parser answers to
    fn format_id(&self) -> &'static str;
}

/// Create the parser for a format identifier
///
/// Returns `None` for formats outside `KNOWN_FORMATS`.
pub fn parser_for(format: &str) -> Option<Box<dyn LineParser>> {
    match format {
        "jsonlines" => Some(Box::new(JsonLinesParser)),
        "nginx-access" => Some(Box::new(NginxAccessParser)),
        "nginx-error" => Some(Box::new(NginxErrorParser)),
        "java-log" => Some(Box::new(JavaLogParser)),
        "php-error" => Some(Box::new(PhpErrorParser)),
        _ => None,
    }
}
