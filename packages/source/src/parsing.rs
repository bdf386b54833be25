//! Shared parsing utilities for conflict event feeds.
//!
//! Field values arrive either as strings (CSV, most ACLED API payloads) or
//! as JSON numbers, so every helper here takes a [`serde_json::Value`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Date layouts accepted for `event_date`, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d %B %Y", "%d %b %Y", "%m/%d/%Y"];

/// Parses an event date into a calendar day.
///
/// Accepts `YYYY-MM-DD`, `D Month YYYY`, `M/D/YYYY` and RFC 3339 or naive
/// ISO timestamps. Timestamps are truncated to the day they name, without
/// any timezone shift.
#[must_use]
pub fn parse_event_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.date());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.date());
    }
    None
}

/// Parses a date out of a string or a Unix timestamp in milliseconds.
#[must_use]
pub fn parse_event_date_value(value: &serde_json::Value) -> Option<NaiveDate> {
    match value {
        serde_json::Value::String(s) => parse_event_date(s),
        serde_json::Value::Number(n) => {
            let millis = n.as_i64()?;
            DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

/// Parses a fatality count.
///
/// Only the leading run of digits counts (`"12 (est.)"` is 12). Missing,
/// non-numeric and negative values are 0. Counts beyond `u32::MAX`
/// saturate.
#[must_use]
pub fn parse_fatalities(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .map_or_else(|| n.as_f64().map_or(0, truncate_float), saturate),
        serde_json::Value::String(s) => parse_leading_count(s),
        _ => 0,
    }
}

fn parse_leading_count(s: &str) -> u32 {
    let s = s.trim_start();
    if s.starts_with('-') {
        return 0;
    }
    let s = s.strip_prefix('+').unwrap_or(s);

    let mut total: u64 = 0;
    for c in s.chars() {
        let Some(digit) = c.to_digit(10) else {
            break;
        };
        total = total.saturating_mul(10).saturating_add(u64::from(digit));
    }
    saturate(total)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn truncate_float(f: f64) -> u32 {
    if f.is_finite() && f > 0.0 {
        // `as` saturates at the target bounds.
        f.trunc() as u32
    } else {
        0
    }
}

fn saturate(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Parses a single coordinate. Returns `None` if missing, unparseable, or
/// not finite.
#[must_use]
pub fn parse_coordinate(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64()?,
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_iso_date() {
        assert_eq!(parse_event_date("2023-01-03"), Some(day(2023, 1, 3)));
    }

    #[test]
    fn parses_acled_long_date() {
        assert_eq!(parse_event_date("3 January 2023"), Some(day(2023, 1, 3)));
        assert_eq!(parse_event_date("24 Feb 2022"), Some(day(2022, 2, 24)));
    }

    #[test]
    fn parses_us_date() {
        assert_eq!(parse_event_date("1/3/2023"), Some(day(2023, 1, 3)));
        assert_eq!(parse_event_date("12/31/2022"), Some(day(2022, 12, 31)));
    }

    #[test]
    fn truncates_timestamps_to_day() {
        assert_eq!(
            parse_event_date("2023-01-03T23:30:00+02:00"),
            Some(day(2023, 1, 3))
        );
        assert_eq!(
            parse_event_date("2023-01-03T14:30:00.000"),
            Some(day(2023, 1, 3))
        );
    }

    #[test]
    fn rejects_invalid_date() {
        assert!(parse_event_date("not-a-date").is_none());
        assert!(parse_event_date("").is_none());
        assert!(parse_event_date("2023-02-30").is_none());
    }

    #[test]
    fn parses_millisecond_timestamp() {
        assert_eq!(
            parse_event_date_value(&json!(1_672_704_000_000_i64)),
            Some(day(2023, 1, 3))
        );
    }

    #[test]
    fn fatalities_leading_digits() {
        assert_eq!(parse_fatalities(&json!("12")), 12);
        assert_eq!(parse_fatalities(&json!(" 7 killed")), 7);
        assert_eq!(parse_fatalities(&json!("+3")), 3);
    }

    #[test]
    fn fatalities_default_to_zero() {
        assert_eq!(parse_fatalities(&json!("")), 0);
        assert_eq!(parse_fatalities(&json!("abc")), 0);
        assert_eq!(parse_fatalities(&json!("-4")), 0);
        assert_eq!(parse_fatalities(&json!(null)), 0);
        assert_eq!(parse_fatalities(&json!(-2)), 0);
    }

    #[test]
    fn fatalities_from_numbers() {
        assert_eq!(parse_fatalities(&json!(5)), 5);
        assert_eq!(parse_fatalities(&json!(5.9)), 5);
        assert_eq!(parse_fatalities(&json!(u64::MAX)), u32::MAX);
    }

    #[test]
    fn parses_coordinates() {
        let lat = parse_coordinate(&json!("48.3794")).unwrap();
        assert!((lat - 48.3794).abs() < f64::EPSILON);
        let lng = parse_coordinate(&json!(31.1656)).unwrap();
        assert!((lng - 31.1656).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert!(parse_coordinate(&json!("")).is_none());
        assert!(parse_coordinate(&json!("north")).is_none());
        assert!(parse_coordinate(&json!("NaN")).is_none());
        assert!(parse_coordinate(&json!("inf")).is_none());
        assert!(parse_coordinate(&json!(null)).is_none());
    }

    #[test]
    fn keeps_zero_coordinates() {
        assert_eq!(parse_coordinate(&json!("0")), Some(0.0));
    }
}
