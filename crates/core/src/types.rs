//! Shared type aliases and timestamp helpers.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// Rendered in place of a timestamp that failed to parse.
pub const INVALID_DATE: &str = "Invalid date";

/// Display format for record timestamps, e.g. `Jan 5, 2023 3:04 PM`.
const DISPLAY_FORMAT: &str = "%b %-d, %Y %-I:%M %p";

/// Parse a backend timestamp string.
///
/// Accepts RFC 3339 with an offset, then naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// or `YYYY-MM-DD HH:MM:SS[.f]` (assumed UTC), then a bare date anchored
/// to midnight UTC. Returns `None` for anything else -- callers choose the
/// fallback, so one malformed record never aborts a whole page.
pub fn parse_timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Format a backend timestamp for display and CSV export.
///
/// Unparsable input renders as [`INVALID_DATE`] rather than erroring.
pub fn format_timestamp(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(ts) => ts.format(DISPLAY_FORMAT).to_string(),
        None => INVALID_DATE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let ts = parse_timestamp("2023-06-15T10:30:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 6, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn parses_naive_datetime_as_utc() {
        let ts = parse_timestamp("2023-06-15T10:30:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 6, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_space_separated_datetime() {
        let ts = parse_timestamp("2023-06-15 10:30:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 6, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_bare_date_at_midnight() {
        let ts = parse_timestamp("2023-06-15").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 6, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn formats_for_display() {
        assert_eq!(format_timestamp("2023-01-05T15:04:00Z"), "Jan 5, 2023 3:04 PM");
        assert_eq!(format_timestamp("2023-11-20T09:07:00Z"), "Nov 20, 2023 9:07 AM");
    }

    #[test]
    fn formats_unparsable_as_invalid_date() {
        assert_eq!(format_timestamp("garbage"), INVALID_DATE);
    }
}
