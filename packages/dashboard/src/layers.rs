//! The set of hex layers built for one config version.

use std::collections::BTreeMap;
use std::sync::Arc;

use conflict_map_dashboard_models::{DashboardConfig, HexConfig};
use conflict_map_event_models::{EventCategory, EventRecord};
use conflict_map_spatial::{GeoPoint, HexBinParams, HexLayer};

/// One [`HexLayer`] per category, frozen at a config version.
///
/// Layers for hidden categories are still built so toggling visibility back
/// on does not need the data again, but they are never picked.
pub struct LayerSet {
    config_version: u64,
    layers: BTreeMap<EventCategory, HexLayer>,
    visible: BTreeMap<EventCategory, bool>,
}

impl LayerSet {
    /// Bins every dataset with the hex settings of `config`.
    #[must_use]
    pub fn build(
        datasets: &BTreeMap<EventCategory, Arc<[EventRecord]>>,
        config: &DashboardConfig,
        config_version: u64,
    ) -> Self {
        let params = hex_params(&config.hex);

        let layers = datasets
            .iter()
            .map(|(category, records)| {
                log::debug!("Building {category} layer ({} events)", records.len());
                (*category, HexLayer::build(Arc::clone(records), &params))
            })
            .collect();

        let visible = datasets
            .keys()
            .map(|category| (*category, config.layers.is_visible(*category)))
            .collect();

        Self {
            config_version,
            layers,
            visible,
        }
    }

    /// Config version these layers were built under.
    #[must_use]
    pub const fn config_version(&self) -> u64 {
        self.config_version
    }

    /// The layer for `category`, visible or not.
    #[must_use]
    pub fn layer(&self, category: EventCategory) -> Option<&HexLayer> {
        self.layers.get(&category)
    }

    /// The layer for `category` if it is shown.
    #[must_use]
    pub fn visible_layer(&self, category: EventCategory) -> Option<&HexLayer> {
        if self.is_visible(category) {
            self.layer(category)
        } else {
            None
        }
    }

    /// Whether `category` is shown.
    #[must_use]
    pub fn is_visible(&self, category: EventCategory) -> bool {
        self.visible.get(&category).copied().unwrap_or(false)
    }

    /// Every layer with its category, in category order.
    pub fn iter(&self) -> impl Iterator<Item = (EventCategory, &HexLayer)> {
        self.layers.iter().map(|(category, layer)| (*category, layer))
    }

    /// Hover text of every visible layer with a bin under `point`.
    #[must_use]
    pub fn tooltips(&self, point: GeoPoint) -> BTreeMap<EventCategory, String> {
        self.iter()
            .filter(|(category, _)| self.is_visible(*category))
            .filter_map(|(category, layer)| layer.tooltip(point).map(|text| (category, text)))
            .collect()
    }
}

/// Hex binning parameters for a config.
#[must_use]
pub const fn hex_params(hex: &HexConfig) -> HexBinParams {
    HexBinParams {
        radius_m: hex.radius_m,
        coverage: hex.coverage,
        percentile_range: hex.percentile_range,
    }
}
