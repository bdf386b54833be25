#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Dashboard configuration, interaction input and update payload types.
//!
//! [`DashboardConfig`] is the single source of every tunable the dashboard
//! reads. Every field has a serde default, so a partial TOML file (or none
//! at all) yields a usable configuration.

use std::collections::BTreeMap;

use conflict_map_analytics_models::{DateSeriesPoint, Statistics};
use conflict_map_event_models::EventCategory;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use conflict_map_analytics_models::DEFAULT_DATE_FORMAT;

/// Default hex bin radius in metres.
pub const DEFAULT_HEX_RADIUS_M: f64 = 10_000.0;

/// Default brushing radius in metres.
pub const DEFAULT_BRUSH_RADIUS_M: f64 = 20_000.0;

/// Every setting the dashboard reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Hex binning.
    pub hex: HexConfig,
    /// Area selection.
    pub brushing: BrushingConfig,
    /// Per-category layer visibility.
    pub layers: LayerVisibility,
    /// Formatting of displayed values.
    pub display: DisplayConfig,
    /// What the panels show before the first interaction.
    pub initial_scope: InitialScope,
}

/// Hex binning settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HexConfig {
    /// Bin radius in metres.
    pub radius_m: f64,
    /// Lower and upper percentile of bin counts kept visible.
    pub percentile_range: [f64; 2],
    /// Fraction of the bin radius that is pickable, `0..=1`.
    pub coverage: f64,
}

impl Default for HexConfig {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_HEX_RADIUS_M,
            percentile_range: [0.0, 100.0],
            coverage: 1.0,
        }
    }
}

/// Area ("brushing") selection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushingConfig {
    /// When set, an interaction selects every bin within `radius_m`
    /// instead of the single bin under the pointer.
    pub enabled: bool,
    /// Brushing radius in metres.
    pub radius_m: f64,
}

impl Default for BrushingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            radius_m: DEFAULT_BRUSH_RADIUS_M,
        }
    }
}

/// Visibility toggle per category layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerVisibility {
    /// Battles layer.
    pub battles: bool,
    /// Explosions layer.
    pub explosions: bool,
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self {
            battles: true,
            explosions: true,
        }
    }
}

impl LayerVisibility {
    /// Whether the layer for `category` is shown.
    #[must_use]
    pub const fn is_visible(&self, category: EventCategory) -> bool {
        match category {
            EventCategory::Battles => self.battles,
            EventCategory::Explosions => self.explosions,
        }
    }

    /// Shows or hides the layer for `category`.
    pub const fn set_visible(&mut self, category: EventCategory, visible: bool) {
        match category {
            EventCategory::Battles => self.battles = visible,
            EventCategory::Explosions => self.explosions = visible,
        }
    }
}

/// Display formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// `chrono` format string for date range bounds.
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// What the statistics panels show before the first interaction.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InitialScope {
    /// Zeroed statistics and an empty series.
    #[default]
    Empty,
    /// Statistics and series over every loaded event.
    FullDataset,
}

/// A pointer interaction (click or hover) on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Longitude under the pointer.
    pub longitude: f64,
    /// Latitude under the pointer.
    pub latitude: f64,
}

impl Interaction {
    /// An interaction at `longitude`, `latitude`.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }
}

/// Everything the panels show after one interaction, published as a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpdate {
    /// Sequence number of the interaction this update answers. `0` for the
    /// initial state.
    pub sequence: u64,
    /// Config version the update was computed under.
    pub config_version: u64,
    /// Statistics per category. Every category is present, hidden ones
    /// with empty statistics.
    pub statistics: BTreeMap<EventCategory, Statistics>,
    /// Per-day counts over every category combined.
    pub series: Vec<DateSeriesPoint>,
}

impl DashboardUpdate {
    /// Total selected events across categories.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.statistics.values().map(|s| s.event_count).sum()
    }
}
