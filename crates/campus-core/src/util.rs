//! Shared utility functions used across multiple modules.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SubsecRound, Utc};

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Parse a remote `updated_at` value into an absolute UTC time.
///
/// Accepts RFC 3339 (`2023-06-01T10:00:00+02:00`), offsets without a colon
/// (`2023-06-01T10:00:00+0200`), naive date-times read as
/// UTC (`2023-06-01T10:00:00.123`, `2023-06-01 10:00:00`) and bare dates
/// (`2023-06-01`, midnight UTC). The result is truncated to milliseconds,
/// the precision the local store persists.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let parsed = DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|value| value.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })?;

    Some(parsed.trunc_subsecs(3))
}

/// Convert a stored Unix millisecond value back to a UTC time.
pub fn timestamp_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// The Unix epoch, used as the watermark of a store that never synced.
pub const fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" https://example.com ".to_string())),
            Some("https://example.com".to_string())
        );
    }

    #[test]
    fn is_http_url_accepts_valid_schemes() {
        assert!(is_http_url("http://localhost"));
        assert!(is_http_url("https://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("example.com"));
    }

    #[test]
    fn parse_timestamp_accepts_rfc3339_with_offset() {
        let parsed = parse_timestamp("2023-06-01T12:30:00+02:00").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 6, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_accepts_offset_without_colon() {
        let expected = Utc.with_ymd_and_hms(2023, 6, 1, 6, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2023-06-01T08:00:00+0200"), Some(expected));
        assert_eq!(
            parse_timestamp("2023-06-01T08:00:00.250-0130")
                .map(|value| value.timestamp_millis()),
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 9, 30, 0).unwrap().timestamp_millis() + 250)
        );
    }

    #[test]
    fn parse_timestamp_reads_naive_values_as_utc() {
        let expected = Utc.with_ymd_and_hms(2023, 6, 1, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2023-06-01T10:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2023-06-01 10:30:00"), Some(expected));
    }

    #[test]
    fn parse_timestamp_accepts_bare_dates() {
        assert_eq!(
            parse_timestamp("2023-06-01"),
            Some(Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn parse_timestamp_truncates_to_millis() {
        let parsed = parse_timestamp("2023-06-01T10:30:00.123456Z").unwrap();
        assert_eq!(parsed.timestamp_subsec_micros(), 123_000);
        assert_eq!(
            timestamp_from_millis(parsed.timestamp_millis()),
            Some(parsed)
        );
    }

    #[test]
    fn parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2023-13-40"), None);
    }
}
