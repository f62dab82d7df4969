//! Normalization of raw portal strings into canonical typed values
//!
//! Every function here is pure, total, and deterministic: malformed input
//! propagates as absence (`None`, midnight, or 0 per the documented policy),
//! never as an error. The portal gives no schema guarantees, so these are the
//! only places allowed to interpret its encodings.

mod rows;

pub use rows::{normalize_flight_row, normalize_movement_row, normalize_transfer_row};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Parses a portal date rendered as `dd/mm/yyyy`
///
/// Components are reordered into a canonical date. Empty or invalid input
/// yields `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").ok()
}

/// Parses a 4-digit 24-hour clock string (`HHMM`) against a date context
///
/// The first two characters are the hour, the next two the minute, combined
/// with the supplied date. Input shorter than 4 characters or empty yields
/// `None`.
pub fn parse_clock_time(raw: &str, date: NaiveDate) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.len() < 4 {
        return None;
    }
    let hour: u32 = trimmed.get(0..2).and_then(|s| s.parse().ok())?;
    let minute: u32 = trimmed.get(2..4).and_then(|s| s.parse().ok())?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(date.and_time(time))
}

/// Parses a clock string (`HHMM`) without a date context
///
/// Used where the record's date is implicit (the outbound leg of a transfer
/// manifest assumes the inbound flight's date). Fewer than 3 characters
/// defaults to midnight; a malformed 4-character string also falls back to
/// midnight rather than failing the record.
pub fn parse_clock_time_only(raw: &str) -> NaiveTime {
    let midnight = NaiveTime::MIN;
    let trimmed = raw.trim();
    if trimmed.len() < 3 {
        return midnight;
    }
    let hour: Option<u32> = trimmed.get(0..2).and_then(|s| s.parse().ok());
    let minute: Option<u32> = trimmed.get(2..4).and_then(|s| s.parse().ok());
    match (hour, minute) {
        (Some(h), Some(m)) => NaiveTime::from_hms_opt(h, m, 0).unwrap_or(midnight),
        _ => midnight,
    }
}

/// Parses a non-negative count rendered as a base-10 integer
///
/// Non-numeric or empty input yields 0. Policy choice: a true zero and an
/// unparsable count are stored identically; callers use [`count_is_parsable`]
/// to surface the difference in logs.
pub fn parse_count(raw: &str) -> u32 {
    raw.trim().parse::<u32>().unwrap_or(0)
}

/// Reports whether a raw count field would survive [`parse_count`] unmangled
///
/// Empty input is considered parsable (a legitimate "no bags" rendering);
/// non-empty garbage is not, and callers log it so data-quality problems are
/// not hidden behind the default 0.
pub fn count_is_parsable(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed.parse::<u32>().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parse_date_reorders_components() {
        let date = parse_date("16/01/2025").unwrap();
        assert_eq!(date.year(), 2025);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 16);
    }

    #[test]
    fn parse_date_roundtrips_to_portal_format() {
        for raw in ["16/01/2025", "01/12/2024", "29/02/2024"] {
            let date = parse_date(raw).unwrap();
            assert_eq!(date.format("%d/%m/%Y").to_string(), raw);
        }
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("2025-01-16"), None);
        assert_eq!(parse_date("32/01/2025"), None);
        assert_eq!(parse_date("29/02/2025"), None);
    }

    #[test]
    fn parse_clock_time_combines_with_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        let dt = parse_clock_time("1234", date).unwrap();
        assert_eq!(dt.date(), date);
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.minute(), 34);
        assert_eq!(dt.second(), 0);
    }

    #[test]
    fn parse_clock_time_rejects_short_input() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        assert_eq!(parse_clock_time("", date), None);
        assert_eq!(parse_clock_time("123", date), None);
        assert_eq!(parse_clock_time("  ", date), None);
    }

    #[test]
    fn parse_clock_time_rejects_nonsense_hours() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        assert_eq!(parse_clock_time("2560", date), None);
        assert_eq!(parse_clock_time("ab12", date), None);
    }

    #[test]
    fn parse_clock_time_survives_multibyte_input() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        assert_eq!(parse_clock_time("1é34", date), None);
        assert_eq!(parse_clock_time("é900", date), None);
        assert_eq!(parse_clock_time("ＡＢ", date), None);
    }

    #[test]
    fn parse_clock_time_only_splits_digits() {
        let time = parse_clock_time_only("0945");
        assert_eq!(time.hour(), 9);
        assert_eq!(time.minute(), 45);
    }

    #[test]
    fn parse_clock_time_only_defaults_to_midnight() {
        let midnight = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_clock_time_only(""), midnight);
        assert_eq!(parse_clock_time_only("12"), midnight);
        assert_eq!(parse_clock_time_only("xx45"), midnight);
    }

    #[test]
    fn parse_count_policy() {
        assert_eq!(parse_count("7"), 7);
        assert_eq!(parse_count(""), 0);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count(" 42 "), 42);
    }

    #[test]
    fn count_parsability_distinguishes_garbage_from_empty() {
        assert!(count_is_parsable("7"));
        assert!(count_is_parsable(""));
        assert!(count_is_parsable("  "));
        assert!(!count_is_parsable("abc"));
        assert!(!count_is_parsable("-3"));
    }
}
