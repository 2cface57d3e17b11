//! Permissive timestamp parsing for backend date strings.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive layouts tried after the zoned ones, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Zoned layouts not covered by RFC 3339 / RFC 2822.
const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f %z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Parse a timestamp in any of the common layouts forum backends emit.
///
/// Accepts RFC 3339, RFC 2822, naive date-times (taken as UTC), bare dates
/// and unix epoch seconds or milliseconds.
#[must_use]
pub fn parse_any(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ZONED_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return parse_epoch(raw);
    }

    None
}

fn parse_epoch(raw: &str) -> Option<DateTime<Utc>> {
    let value: i64 = raw.parse().ok()?;
    // 13+ digits are milliseconds
    if raw.len() >= 13 {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            parse_any("2024-01-15T12:34:56.789Z").map(|d| d.timestamp()),
            Some(utc(2024, 1, 15, 12, 34, 56).timestamp())
        );
        assert_eq!(
            parse_any("2024-01-15T14:34:56+02:00"),
            Some(utc(2024, 1, 15, 12, 34, 56))
        );
    }

    #[test]
    fn test_rfc2822() {
        assert_eq!(
            parse_any("Mon, 01 Jan 2024 12:00:00 +0000"),
            Some(utc(2024, 1, 1, 12, 0, 0))
        );
    }

    #[test]
    fn test_naive_formats() {
        assert_eq!(
            parse_any("2024-01-15 12:34:56"),
            Some(utc(2024, 1, 15, 12, 34, 56))
        );
        assert_eq!(
            parse_any("2024-01-15T12:34:56.123456"),
            Some(utc(2024, 1, 15, 12, 34, 56) + chrono::Duration::microseconds(123_456))
        );
        assert_eq!(parse_any("2024-01-15"), Some(utc(2024, 1, 15, 0, 0, 0)));
    }

    #[test]
    fn test_epoch() {
        assert_eq!(parse_any("1704110400"), Some(utc(2024, 1, 1, 12, 0, 0)));
        assert_eq!(parse_any("1704110400000"), Some(utc(2024, 1, 1, 12, 0, 0)));
    }

    #[test]
    fn test_garbage() {
        assert_eq!(parse_any(""), None);
        assert_eq!(parse_any("   "), None);
        assert_eq!(parse_any("not a date"), None);
        assert_eq!(parse_any("2024-13-45"), None);
    }
}
