//! Summary statistics over a selection of events.

use std::fmt::Write as _;

use chrono::NaiveDate;
use conflict_map_analytics_models::{DateRange, Statistics};
use conflict_map_event_models::EventRecord;

pub use conflict_map_analytics_models::DEFAULT_DATE_FORMAT;

/// Computes [`Statistics`] for `records` using [`DEFAULT_DATE_FORMAT`].
///
/// Duplicates are counted as given; deduplication is the caller's job.
#[must_use]
pub fn compute_statistics<'a, I>(records: I) -> Statistics
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    compute_statistics_with_format(records, DEFAULT_DATE_FORMAT)
}

/// Computes [`Statistics`] for `records`, rendering the date range with a
/// `chrono` strftime `date_format`.
#[must_use]
pub fn compute_statistics_with_format<'a, I>(records: I, date_format: &str) -> Statistics
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut event_count: u64 = 0;
    let mut total_fatalities: u64 = 0;
    let mut max_fatalities: u32 = 0;
    let mut bounds: Option<(NaiveDate, NaiveDate)> = None;

    for record in records {
        event_count += 1;
        total_fatalities += u64::from(record.fatalities);
        max_fatalities = max_fatalities.max(record.fatalities);
        bounds = Some(match bounds {
            None => (record.event_date, record.event_date),
            Some((min, max)) => (min.min(record.event_date), max.max(record.event_date)),
        });
    }

    let Some((min_date, max_date)) = bounds else {
        return Statistics::empty();
    };

    Statistics {
        event_count,
        total_fatalities,
        average_fatalities: format_average(total_fatalities, event_count),
        max_fatalities,
        date_range: DateRange {
            start: format_day(min_date, date_format),
            end: format_day(max_date, date_format),
        },
    }
}

/// Formats `date` with `date_format`, falling back to ISO `YYYY-MM-DD` when
/// the format has invalid or time-only specifiers.
fn format_day(date: NaiveDate, date_format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(date_format)).is_err() {
        log::warn!("Unusable date format {date_format:?}, using ISO dates");
        return date.format("%Y-%m-%d").to_string();
    }
    out
}

/// `total / count` with exactly two decimals, ties rounded up (`0.125` is
/// `"0.13"`).
fn format_average(total: u64, count: u64) -> String {
    if count == 0 {
        return "0".to_string();
    }
    let (total, count) = (u128::from(total), u128::from(count));
    let hundredths = (total * 200 + count) / (count * 2);
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}
