//! Tests for the nginx error log parser

use super::*;
use chrono::TimeZone;

fn parse(line: &str) -> LogRecord {
    NginxErrorParser.parse(line)
}

#[test]
fn test_error_line() {
    let line = "2023/12/01 10:30:45 [error] 1234#0: upstream timed out while reading";
    let record = parse(line);

    assert_eq!(record.level, "error");
    assert_eq!(record.message, "upstream timed out while reading");
    assert_eq!(
        record.timestamp,
        Utc.with_ymd_and_hms(2023, 12, 1, 10, 30, 45).unwrap()
    );
    assert_eq!(record.source, "nginx-error");
}

#[test]
fn test_level_is_the_captured_tag() {
    let line = "2023/12/01 10:30:45 [crit] 99#2: worker process exited";
    assert_eq!(parse(line).level, "crit");

    let line = "2023/12/01 10:30:45 [warn] 99#2: conflicting server name";
    assert_eq!(parse(line).level, "warn");
}

#[test]
fn test_unmatched_line_falls_back_to_error() {
    let line = "malloc(): corrupted top size";
    let record = parse(line);

    assert_eq!(record.level, "error");
    assert_eq!(record.message, line);
    assert_eq!(record.original_log, line);
}
