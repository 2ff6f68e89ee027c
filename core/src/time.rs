//! Time related utils.

use crate::Error;
use chrono::SecondsFormat;
use chrono::Utc;

/// DateTime is the alias for chrono::DateTime<Utc>.
pub type DateTime = chrono::DateTime<Utc>;

/// Create a new DateTime at now.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into date: `2022-03-13`
///
/// This is the precision the storage management API accepts for SAS windows.
pub fn format_date(t: DateTime) -> String {
    t.format("%Y-%m-%d").to_string()
}

/// Format time into RFC3339: `2022-03-13T07:20:04Z`
pub fn format_rfc3339(t: DateTime) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse time from RFC3339.
///
/// All input time SHOULD follow [RFC3339](https://datatracker.ietf.org/doc/html/rfc3339).
pub fn parse_rfc3339(s: &str) -> crate::Result<DateTime> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|v| v.with_timezone(&Utc))
        .map_err(|e| Error::unexpected(format!("failed to parse rfc3339 time: {s}")).with_source(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_time() -> DateTime {
        Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(test_time()), "2022-03-01");
    }

    #[test]
    fn test_rfc3339() {
        let s = format_rfc3339(test_time());
        assert_eq!(s, "2022-03-01T08:12:34Z");
        assert_eq!(parse_rfc3339(&s).unwrap(), test_time());
        assert!(parse_rfc3339("2022-03-01").is_err());
    }
}
