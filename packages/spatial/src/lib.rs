#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hexagonal binning and spatial selection for conflict events.
//!
//! Events are bucketed into H3 cells sized to the requested bin radius
//! ([`HexLayer`]). Bin centroids are indexed in an R-tree so radius
//! ("brushing") queries only touch nearby bins. Selection resolution is
//! written against the [`BinSource`] trait so renderers that do their own
//! binning can plug in their picking primitive instead.

pub mod hexbin;
pub mod selection;

pub use hexbin::{HexBinParams, HexLayer, SpatialBin};
pub use selection::{SelectionMode, SelectionResult, resolve_selection};

use conflict_map_event_models::EventRecord;

/// Mean earth radius used for degree/metre conversions, in metres.
pub const MEAN_EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic point in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Longitude.
    pub longitude: f64,
    /// Latitude.
    pub latitude: f64,
}

impl GeoPoint {
    /// Creates a point from longitude and latitude.
    #[must_use]
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Great-circle distance to `other` in metres.
    #[must_use]
    pub fn haversine_distance_m(self, other: Self) -> f64 {
        use geo::{Distance as _, Haversine};

        Haversine.distance(
            geo::Point::new(self.longitude, self.latitude),
            geo::Point::new(other.longitude, other.latitude),
        )
    }
}

/// The spatial binning/picking primitive consumed by selection.
///
/// Implementations own the bin → member association; selection never looks
/// at bin geometry directly.
pub trait BinSource {
    /// Identifier of one bin.
    type BinId: Copy + Ord;

    /// The bin under `point`, if any visible bin is hit.
    fn pick_point(&self, point: GeoPoint) -> Option<Self::BinId>;

    /// Every visible bin whose centroid lies within `radius_m` metres of
    /// `point`.
    fn pick_within(&self, point: GeoPoint, radius_m: f64) -> Vec<Self::BinId>;

    /// The records aggregated into `bin`. Unknown ids yield nothing.
    fn members(&self, bin: Self::BinId) -> impl Iterator<Item = &EventRecord> + '_;
}
