//! Timestamp parsing for request payloads and query strings.

use chrono::{DateTime, NaiveDate, Utc};

/// Parse an ISO-8601 / RFC 3339 date-time with an explicit offset.
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Like [`parse_datetime`], but also accepts a bare `YYYY-MM-DD`, read as
/// midnight UTC. Used for query-string filters.
pub fn parse_date_or_datetime(value: &str) -> Option<DateTime<Utc>> {
    parse_datetime(value).or_else(|| {
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_utc_and_offsets() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        assert_eq!(parse_datetime("2024-06-01T09:00:00Z"), Some(expected));
        assert_eq!(parse_datetime("2024-06-01T09:00:00.000Z"), Some(expected));
        assert_eq!(parse_datetime("2024-06-01T11:00:00+02:00"), Some(expected));
    }

    #[test]
    fn rejects_garbage_and_bare_dates() {
        assert_eq!(parse_datetime("tomorrow"), None);
        assert_eq!(parse_datetime("2024-06-01"), None);
    }

    #[test]
    fn query_form_accepts_bare_dates() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date_or_datetime("2024-06-01"), Some(expected));
        assert_eq!(parse_date_or_datetime("2024-13-01"), None);
    }
}
