#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Summary statistics and time-series types derived from event selections.
//!
//! These are display-oriented values: [`Statistics::average_fatalities`] and
//! the [`DateRange`] bounds are pre-formatted strings and must not be fed
//! back into arithmetic.

use std::collections::BTreeMap;

use conflict_map_event_models::EventCategory;
use serde::{Deserialize, Serialize};

/// Placeholder shown for date bounds of an empty selection.
pub const NOT_AVAILABLE: &str = "N/A";

/// Default display format for date range bounds, US short date (`1/3/2023`).
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Formatted earliest and latest event dates of a selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Earliest event date, or `"N/A"`.
    pub start: String,
    /// Latest event date, or `"N/A"`.
    pub end: String,
}

impl Default for DateRange {
    fn default() -> Self {
        Self {
            start: NOT_AVAILABLE.to_string(),
            end: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Summary statistics over a set of events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Number of events.
    pub event_count: u64,
    /// Sum of fatalities.
    pub total_fatalities: u64,
    /// Mean fatalities per event, two decimals (`"0"` when empty).
    pub average_fatalities: String,
    /// Largest fatality count of a single event.
    pub max_fatalities: u32,
    /// Earliest and latest event dates.
    pub date_range: DateRange,
}

impl Statistics {
    /// Statistics of an empty selection.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            event_count: 0,
            total_fatalities: 0,
            average_fatalities: "0".to_string(),
            max_fatalities: 0,
            date_range: DateRange::default(),
        }
    }

    /// Whether no events contributed to these statistics.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.event_count == 0
    }
}

impl Default for Statistics {
    fn default() -> Self {
        Self::empty()
    }
}

/// Event counts for a single calendar day, per category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSeriesPoint {
    /// ISO `YYYY-MM-DD` day key.
    pub date: String,
    /// Count per aggregated category. Every aggregated category has an
    /// entry, zero when it had no events that day.
    pub counts: BTreeMap<EventCategory, u64>,
}

impl DateSeriesPoint {
    /// Count for `category`, zero if the category was not aggregated.
    #[must_use]
    pub fn count(&self, category: EventCategory) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Sum across all categories (the stacked bar height).
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// An x-axis tick on the stacked chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartTick {
    /// Day key of the point the tick sits under.
    pub date: String,
    /// Tick label, e.g. `"Jan 2024"`.
    pub label: String,
}

/// A date series prepared for a stacked bar chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    /// Stacking order, bottom to top.
    pub keys: Vec<EventCategory>,
    /// Points sorted ascending by date.
    pub points: Vec<DateSeriesPoint>,
    /// Largest stacked total (upper bound of the y domain).
    pub max_stack: u64,
    /// X-axis ticks.
    pub ticks: Vec<ChartTick>,
}
