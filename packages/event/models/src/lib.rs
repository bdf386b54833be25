#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conflict event record and category types.
//!
//! Every loader produces [`EventRecord`]s, one collection per
//! [`EventCategory`]. Records are immutable once loaded and are shared
//! read-only by the binning, selection and aggregation stages.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The kind of conflict event a dataset holds.
///
/// Categories are disjoint by construction: a record belongs to exactly one
/// dataset, so cross-category aggregation never needs deduplication.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventCategory {
    /// Armed clashes between organized groups
    Battles,
    /// Explosions and remote violence (shelling, air strikes, IEDs)
    Explosions,
}

impl EventCategory {
    /// Returns all variants of this enum in display order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Battles, Self::Explosions]
    }

    /// Heading shown above this category's statistics panel.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Battles => "Battles Statistics",
            Self::Explosions => "Explosions Statistics",
        }
    }
}

/// A single conflict event normalized from an input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Source event identifier (e.g. ACLED `event_id_cnty`). Used to
    /// deduplicate selections.
    pub id: String,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Calendar day the event occurred.
    pub event_date: NaiveDate,
    /// Reported fatalities; 0 when the source value was missing or invalid.
    pub fatalities: u32,
}

impl EventRecord {
    /// Creates a record from already-parsed values.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        longitude: f64,
        latitude: f64,
        event_date: NaiveDate,
        fatalities: u32,
    ) -> Self {
        Self {
            id: id.into(),
            longitude,
            latitude,
            event_date,
            fatalities,
        }
    }

    /// ISO `YYYY-MM-DD` key for the day this event falls on.
    #[must_use]
    pub fn day_key(&self) -> String {
        self.event_date.format("%Y-%m-%d").to_string()
    }

    /// Whether both coordinates are finite numbers.
    ///
    /// Out-of-range but finite coordinates still count as finite; their
    /// spatial placement is simply undefined.
    #[must_use]
    pub const fn has_finite_position(&self) -> bool {
        self.longitude.is_finite() && self.latitude.is_finite()
    }
}
