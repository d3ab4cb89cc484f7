//! Timestamp parsing helpers shared by the format parsers

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a naive local-less timestamp and take it as UTC.
///
/// Log formats without a zone component (nginx error, java) carry no
/// offset information; the original system reads them as UTC as well.
pub(crate) fn naive_as_utc(value: &str, format: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parse a timestamp with an explicit numeric offset (e.g. `-0700`).
pub(crate) fn with_offset(value: &str, format: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_str(value, format)
        .ok()
        .map(|fixed| fixed.with_timezone(&Utc))
}

/// Parse a php-error timestamp of the form `02-Jan-2006 15:04:05 MST`.
///
/// chrono cannot resolve zone abbreviations, so the trailing name is
/// stripped and the time taken as UTC (php logs carry UTC in practice).
pub(crate) fn php_datetime(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    let without_zone = match trimmed.rsplit_once(' ') {
        Some((head, tail)) if tail.chars().all(|c| c.is_ascii_alphabetic()) => head,
        _ => trimmed,
    };
    naive_as_utc(without_zone, "%d-%b-%Y %H:%M:%S")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_with_offset_normalizes_to_utc() {
        let parsed = with_offset("10/Oct/2023:13:55:36 +0000", "%d/%b/%Y:%H:%M:%S %z").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 10, 10, 13, 55, 36).unwrap());

        let offset = with_offset("10/Oct/2023:06:55:36 -0700", "%d/%b/%Y:%H:%M:%S %z").unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2023, 10, 10, 13, 55, 36).unwrap());
    }

    #[test]
    fn test_php_datetime_strips_zone_name() {
        let parsed = php_datetime("01-Dec-2023 10:30:45 UTC").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 12, 1, 10, 30, 45).unwrap());
    }

    #[test]
    fn test_php_datetime_without_zone() {
        let parsed = php_datetime("01-Dec-2023 10:30:45").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 12, 1, 10, 30, 45).unwrap());
    }

    #[test]
    fn test_garbage_is_none() {
        assert!(naive_as_utc("not a time", "%Y/%m/%d %H:%M:%S").is_none());
        assert!(php_datetime("yesterday-ish").is_none());
    }
}
