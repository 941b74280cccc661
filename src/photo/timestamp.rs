//! Timestamp formats used by corrections, prompts and EXIF

use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;

/// Format of corrections and typed answers: `YYYY-MM-DD HH:MM:SS`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// EXIF `DateTime` format: `YYYY:MM:DD HH:MM:SS`
pub const EXIF_TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Rejected timestamp input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimestampParseError {
    #[error("no timestamp given")]
    Empty,

    #[error("{input:?} is not a YYYY-MM-DD HH:MM:SS timestamp: {reason}")]
    Invalid { input: String, reason: String },
}

/// Parse a fully specified `YYYY-MM-DD HH:MM:SS` timestamp.
///
/// Surrounding whitespace is ignored; anything else (a bare date, a missing
/// seconds field, trailing text) is rejected.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, TimestampParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(TimestampParseError::Empty);
    }
    NaiveDateTime::parse_from_str(trimmed, TIMESTAMP_FORMAT).map_err(|e| {
        TimestampParseError::Invalid {
            input: trimmed.to_string(),
            reason: e.to_string(),
        }
    })
}

/// Parse an EXIF ASCII timestamp (trailing NULs and spaces tolerated)
pub fn parse_exif_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    NaiveDateTime::parse_from_str(trimmed, EXIF_TIMESTAMP_FORMAT).ok()
}

/// Render in the correction-file format
#[must_use]
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Drop sub-second precision so filesystem times compare like EXIF times
#[must_use]
pub fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn parses_canonical_format() {
        assert_eq!(
            parse_timestamp("2024-03-05 07:08:09").unwrap(),
            ts(2024, 3, 5, 7, 8, 9)
        );
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            parse_timestamp("  2024-03-05 07:08:09\n").unwrap(),
            ts(2024, 3, 5, 7, 8, 9)
        );
    }

    #[test]
    fn rejects_partial_input() {
        assert!(matches!(
            parse_timestamp("2024-03-05"),
            Err(TimestampParseError::Invalid { .. })
        ));
        assert!(parse_timestamp("2024-03-05 07:08").is_err());
        assert!(parse_timestamp("2024-03-05 07:08:09 extra").is_err());
    }

    #[test]
    fn rejects_exif_style_and_impossible_dates() {
        assert!(parse_timestamp("2024:03:05 07:08:09").is_err());
        assert!(parse_timestamp("2024-02-30 07:08:09").is_err());
        assert!(parse_timestamp("2024-03-05 25:00:00").is_err());
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(parse_timestamp("   "), Err(TimestampParseError::Empty));
    }

    #[test]
    fn parses_exif_with_nul_padding() {
        assert_eq!(
            parse_exif_timestamp("2023:12:31 23:59:58\0"),
            Some(ts(2023, 12, 31, 23, 59, 58))
        );
        assert_eq!(parse_exif_timestamp("0000:00:00 00:00:00"), None);
    }

    #[test]
    fn format_matches_parse() {
        let value = ts(2024, 1, 2, 3, 4, 5);
        assert_eq!(format_timestamp(&value), "2024-01-02 03:04:05");
    }

    #[test]
    fn truncates_nanoseconds() {
        let value = ts(2024, 1, 2, 3, 4, 5).with_nanosecond(123_456_789).unwrap();
        assert_eq!(truncate_to_seconds(value), ts(2024, 1, 2, 3, 4, 5));
    }
}
