//! Time related utils.

use chrono::Utc;

/// DateTime in UTC.
pub type DateTime = chrono::DateTime<Utc>;

/// The current time in UTC.
pub fn now() -> DateTime {
    Utc::now()
}

/// Format time into the basic ISO 8601 form carried by `x-date`, no
/// separators and no milliseconds: "20220313T072004Z".
pub fn format_iso8601(t: DateTime) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Format time into date: "20220313".
pub fn format_date(t: DateTime) -> String {
    t.format("%Y%m%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_iso8601() {
        let t = Utc.with_ymd_and_hms(2022, 3, 13, 7, 20, 4).unwrap();
        assert_eq!(format_iso8601(t), "20220313T072004Z");
    }

    #[test]
    fn test_format_date() {
        let t = Utc.with_ymd_and_hms(2022, 3, 13, 7, 20, 4).unwrap();
        assert_eq!(format_date(t), "20220313");
    }

    #[test]
    fn test_date_is_iso8601_prefix() {
        let t = now();
        assert_eq!(format_iso8601(t)[..8], format_date(t));
    }
}
