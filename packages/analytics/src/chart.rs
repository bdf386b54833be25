//! Preparation of a date series for a stacked bar chart.
//!
//! Drawing is left to the renderer; this only fixes the ordering, the y
//! domain and the x-axis ticks so every renderer shows the same chart.

use chrono::NaiveDate;
use conflict_map_analytics_models::{ChartSeries, ChartTick, DateSeriesPoint};
use conflict_map_event_models::EventCategory;

/// One tick roughly every three months of daily points.
pub const TICK_EVERY: usize = 90;

/// Tick label format (`Jan 2024`).
const TICK_FORMAT: &str = "%b %Y";

/// Sorts `points` ascending by date and derives the stacked-chart layout
/// for the given stacking `keys`.
///
/// The series coming out of the date aggregator carries no ordering
/// contract, so the sort here is unconditional.
#[must_use]
pub fn prepare_chart(mut points: Vec<DateSeriesPoint>, keys: &[EventCategory]) -> ChartSeries {
    points.sort_by_cached_key(|p| (parse_day(&p.date), p.date.clone()));

    let max_stack = points
        .iter()
        .map(|p| keys.iter().map(|k| p.count(*k)).sum::<u64>())
        .max()
        .unwrap_or(0);

    let ticks = points
        .iter()
        .step_by(TICK_EVERY)
        .map(|p| ChartTick {
            date: p.date.clone(),
            label: parse_day(&p.date)
                .map_or_else(|| p.date.clone(), |d| d.format(TICK_FORMAT).to_string()),
        })
        .collect();

    ChartSeries {
        keys: keys.to_vec(),
        points,
        max_stack,
        ticks,
    }
}

fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
