//! Date and time assembly for registration payloads.
//!
//! Input dates arrive either as `DD/MM/YYYY` strings or as Excel serial
//! numbers (days since 1899-12-30). Times may carry AM/PM markers or omit
//! seconds. Timestamps are treated as local wall-clock values and serialized
//! without an offset suffix: `"15/06/2024" + "14:30"` → `2024-06-15T14:30:00`.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

static MERIDIEM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(am|pm)").unwrap());

/// Strips AM/PM markers and surrounding whitespace from a time string.
pub fn clean_time(raw: &str) -> String {
    MERIDIEM_RE.replace_all(raw.trim(), "").trim().to_string()
}

/// Converts an Excel serial date (days since 1899-12-30, which absorbs the
/// Excel 1900 leap-year bug) to a calendar date.
pub fn excel_serial_to_date(serial: i64) -> Option<NaiveDate> {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    base.checked_add_signed(Duration::days(serial))
}

/// Builds a naive timestamp from the record's date and time cells. Returns
/// `None` when the date cell is empty or unparseable.
pub fn parse_record_datetime(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = date.trim();
    if date.is_empty() {
        return None;
    }

    let day = if date.chars().all(|c| c.is_ascii_digit()) {
        excel_serial_to_date(date.parse().ok()?)?
    } else {
        NaiveDate::parse_from_str(date, "%d/%m/%Y").ok()?
    };

    let mut cleaned = clean_time(time);
    if cleaned.is_empty() {
        cleaned = "00:00:00".to_string();
    } else if cleaned.matches(':').count() == 1 {
        cleaned.push_str(":00");
    }
    let time_of_day = NaiveTime::parse_from_str(&cleaned, "%H:%M:%S").ok()?;

    Some(day.and_time(time_of_day))
}

/// Serializes a timestamp in the fixed local-wall-clock convention.
pub fn to_iso_string(datetime: &NaiveDateTime) -> String {
    datetime.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_european_date_and_short_time() {
        let dt = parse_record_datetime("15/06/2024", "14:30").unwrap();
        assert_eq!(to_iso_string(&dt), "2024-06-15T14:30:00");
    }

    #[test]
    fn strips_meridiem_markers() {
        assert_eq!(clean_time(" 10:30 AM "), "10:30");
        assert_eq!(clean_time("10:30:15pm"), "10:30:15");
        let dt = parse_record_datetime("01/01/2024", "10:30 am").unwrap();
        assert_eq!(to_iso_string(&dt), "2024-01-01T10:30:00");
    }

    #[test]
    fn excel_serial_dates_convert_before_merging() {
        assert_eq!(
            excel_serial_to_date(45000).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 15).unwrap()
        );
        let dt = parse_record_datetime("45000", "14:30").unwrap();
        assert_eq!(to_iso_string(&dt), "2023-03-15T14:30:00");
    }

    #[test]
    fn missing_time_defaults_to_midnight() {
        let dt = parse_record_datetime("15/06/2024", "").unwrap();
        assert_eq!(to_iso_string(&dt), "2024-06-15T00:00:00");
    }

    #[test]
    fn empty_or_invalid_dates_are_none() {
        assert!(parse_record_datetime("", "14:30").is_none());
        assert!(parse_record_datetime("not-a-date", "14:30").is_none());
    }
}
