//! H3-backed hexagon binning.
//!
//! A [`HexLayer`] is the binned view of one event collection at one set of
//! [`HexBinParams`]. It is immutable: changing any parameter means building a
//! new layer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use conflict_map_event_models::EventRecord;
use h3o::{CellIndex, LatLng, Resolution};
use rstar::{AABB, RTree, RTreeObject};

use crate::{BinSource, GeoPoint, MEAN_EARTH_RADIUS_M};

/// Elevation scale applied to layers that hold data.
pub const ELEVATION_SCALE: f64 = 50.0;

/// Metres per degree of latitude.
const METERS_PER_DEGREE: f64 = MEAN_EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Slack on the degree envelope so the exact haversine check is the only
/// thing that rejects borderline centroids.
const ENVELOPE_SLACK: f64 = 1.01;

/// Binning parameters, passed through from the dashboard controls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexBinParams {
    /// Target bin radius in metres.
    pub radius_m: f64,
    /// Fraction of each bin's radius that is drawn and pickable (0-1).
    pub coverage: f64,
    /// `[lower, upper]` percentile of bin counts that stays visible (0-100).
    pub percentile_range: [f64; 2],
}

impl Default for HexBinParams {
    fn default() -> Self {
        Self {
            radius_m: 10_000.0,
            coverage: 1.0,
            percentile_range: [0.0, 100.0],
        }
    }
}

/// One hexagonal bin and the records that fall inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialBin {
    /// H3 cell backing this bin.
    pub cell: CellIndex,
    /// Centroid longitude.
    pub centroid_lng: f64,
    /// Centroid latitude.
    pub centroid_lat: f64,
    /// Indices into the layer's record slice.
    pub members: Vec<usize>,
    /// Whether the bin's count falls inside the percentile range.
    pub visible: bool,
}

impl SpatialBin {
    /// Number of events in this bin.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.members.len()
    }

    /// Bin centroid.
    #[must_use]
    pub const fn centroid(&self) -> GeoPoint {
        GeoPoint::new(self.centroid_lng, self.centroid_lat)
    }
}

/// A visible bin centroid stored in the R-tree.
struct CentroidEntry {
    cell: CellIndex,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for CentroidEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Hex-binned view of one event collection.
pub struct HexLayer {
    records: Arc<[EventRecord]>,
    resolution: Resolution,
    /// Distance from the centroid inside which a point pick hits; `None`
    /// when coverage spans the whole cell.
    pick_radius_m: Option<f64>,
    bins: BTreeMap<CellIndex, SpatialBin>,
    centroids: RTree<CentroidEntry>,
    unplaced: usize,
}

impl HexLayer {
    /// Bins `records` according to `params`.
    ///
    /// Records whose coordinates cannot be placed on the H3 grid are
    /// skipped and counted in [`Self::unplaced`].
    #[must_use]
    pub fn build(records: Arc<[EventRecord]>, params: &HexBinParams) -> Self {
        let resolution = resolution_for_radius(params.radius_m);
        let edge_length_m = resolution.edge_length_m();

        let mut bins: BTreeMap<CellIndex, SpatialBin> = BTreeMap::new();
        let mut unplaced = 0;

        for (idx, record) in records.iter().enumerate() {
            let Ok(coord) = LatLng::new(record.latitude, record.longitude) else {
                log::debug!(
                    "Skipping event {} with unplaceable position ({}, {})",
                    record.id,
                    record.longitude,
                    record.latitude
                );
                unplaced += 1;
                continue;
            };

            let cell = coord.to_cell(resolution);
            bins.entry(cell)
                .or_insert_with(|| {
                    let centroid = LatLng::from(cell);
                    SpatialBin {
                        cell,
                        centroid_lng: centroid.lng(),
                        centroid_lat: centroid.lat(),
                        members: Vec::new(),
                        visible: true,
                    }
                })
                .members
                .push(idx);
        }

        apply_percentile_filter(&mut bins, params.percentile_range);

        let entries: Vec<CentroidEntry> = bins
            .values()
            .filter(|bin| bin.visible)
            .map(|bin| CentroidEntry {
                cell: bin.cell,
                envelope: AABB::from_point([bin.centroid_lng, bin.centroid_lat]),
            })
            .collect();
        let hidden = bins.len() - entries.len();
        let centroids = RTree::bulk_load(entries);

        let pick_radius_m = if params.coverage >= 1.0 {
            None
        } else {
            Some(edge_length_m * params.coverage.max(0.0))
        };

        log::info!(
            "Built {} hex bins at H3 resolution {} (~{edge_length_m:.0} m edge) from {} events \
             ({unplaced} unplaced, {hidden} hidden by percentile range)",
            bins.len(),
            u8::from(resolution),
            records.len(),
        );

        Self {
            records,
            resolution,
            pick_radius_m,
            bins,
            centroids,
            unplaced,
        }
    }

    /// The records this layer was built from.
    #[must_use]
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// H3 resolution chosen for the requested radius.
    #[must_use]
    pub const fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Number of records that could not be placed on the grid.
    #[must_use]
    pub const fn unplaced(&self) -> usize {
        self.unplaced
    }

    /// All bins, visible or not, in cell order.
    pub fn bins(&self) -> impl Iterator<Item = &SpatialBin> {
        self.bins.values()
    }

    /// Bins inside the percentile range, in cell order.
    pub fn visible_bins(&self) -> impl Iterator<Item = &SpatialBin> {
        self.bins.values().filter(|bin| bin.visible)
    }

    /// Looks up a bin by cell.
    #[must_use]
    pub fn bin(&self, cell: CellIndex) -> Option<&SpatialBin> {
        self.bins.get(&cell)
    }

    /// The visible bin drawn under `point`.
    #[must_use]
    pub fn bin_at(&self, point: GeoPoint) -> Option<&SpatialBin> {
        let coord = LatLng::new(point.latitude, point.longitude).ok()?;
        let bin = self.bins.get(&coord.to_cell(self.resolution))?;
        if !bin.visible {
            return None;
        }
        match self.pick_radius_m {
            Some(limit) if point.haversine_distance_m(bin.centroid()) > limit => None,
            _ => Some(bin),
        }
    }

    /// Visible bins whose centroid lies within `radius_m` of `point`,
    /// in cell order.
    #[must_use]
    pub fn bins_within(&self, point: GeoPoint, radius_m: f64) -> Vec<&SpatialBin> {
        if radius_m.is_nan()
            || radius_m <= 0.0
            || !point.longitude.is_finite()
            || !point.latitude.is_finite()
        {
            return Vec::new();
        }

        let mut cells = BTreeSet::new();
        for envelope in degree_envelopes(point, radius_m) {
            for entry in self.centroids.locate_in_envelope_intersecting(&envelope) {
                cells.insert(entry.cell);
            }
        }

        cells
            .into_iter()
            .filter_map(|cell| self.bins.get(&cell))
            .filter(|bin| point.haversine_distance_m(bin.centroid()) <= radius_m)
            .collect()
    }

    /// Hover text for the visible bin under `point`.
    #[must_use]
    pub fn tooltip(&self, point: GeoPoint) -> Option<String> {
        self.bin_at(point).map(|bin| {
            format!(
                "latitude: {:.6}\nlongitude: {:.6}\nEvent Count: {}",
                bin.centroid_lat,
                bin.centroid_lng,
                bin.count()
            )
        })
    }

    /// Extrusion scale for the renderer: flat when the layer is empty.
    #[must_use]
    pub fn elevation_scale(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            ELEVATION_SCALE
        }
    }

    /// Exports the visible bins as a `GeoJSON` feature collection of hexagon
    /// polygons with `cell` and `count` properties.
    #[must_use]
    pub fn to_feature_collection(&self) -> geojson::FeatureCollection {
        let features = self
            .visible_bins()
            .map(|bin| {
                let mut ring: Vec<Vec<f64>> = bin
                    .cell
                    .boundary()
                    .iter()
                    .map(|v| vec![v.lng(), v.lat()])
                    .collect();
                if let Some(first) = ring.first().cloned() {
                    ring.push(first);
                }

                let mut properties = serde_json::Map::new();
                properties.insert(
                    "cell".to_string(),
                    serde_json::Value::String(bin.cell.to_string()),
                );
                properties.insert("count".to_string(), serde_json::Value::from(bin.count()));

                geojson::Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::Polygon(vec![ring]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        geojson::FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

impl BinSource for HexLayer {
    type BinId = CellIndex;

    fn pick_point(&self, point: GeoPoint) -> Option<CellIndex> {
        self.bin_at(point).map(|bin| bin.cell)
    }

    fn pick_within(&self, point: GeoPoint, radius_m: f64) -> Vec<CellIndex> {
        self.bins_within(point, radius_m)
            .into_iter()
            .map(|bin| bin.cell)
            .collect()
    }

    fn members(&self, bin: CellIndex) -> impl Iterator<Item = &EventRecord> + '_ {
        self.bins
            .get(&bin)
            .map(|bin| bin.members.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&idx| self.records.get(idx))
    }
}

/// Picks the H3 resolution whose average edge length is closest to
/// `radius_m`. Hexagon edge length equals its circumradius.
///
/// Non-positive or NaN radii map to the finest resolution, infinite radii
/// to the coarsest.
#[must_use]
pub fn resolution_for_radius(radius_m: f64) -> Resolution {
    if radius_m.is_nan() || radius_m <= 0.0 {
        return Resolution::Fifteen;
    }
    if radius_m.is_infinite() {
        return Resolution::Zero;
    }

    (0u8..=15)
        .filter_map(|r| Resolution::try_from(r).ok())
        .min_by(|a, b| {
            let da = (a.edge_length_m() - radius_m).abs();
            let db = (b.edge_length_m() - radius_m).abs();
            da.total_cmp(&db)
        })
        .unwrap_or(Resolution::Fifteen)
}

/// Hides bins whose count falls outside the `[lower, upper]` percentile of
/// all bin counts.
fn apply_percentile_filter(bins: &mut BTreeMap<CellIndex, SpatialBin>, range: [f64; 2]) {
    if bins.is_empty() {
        return;
    }

    let clamp = |p: f64| if p.is_nan() { 0.0 } else { p.clamp(0.0, 100.0) };
    let (mut lower, mut upper) = (clamp(range[0]), clamp(range[1]));
    if range[1].is_nan() {
        upper = 100.0;
    }
    if lower > upper {
        std::mem::swap(&mut lower, &mut upper);
    }
    if lower <= 0.0 && upper >= 100.0 {
        return;
    }

    let mut counts: Vec<usize> = bins.values().map(SpatialBin::count).collect();
    counts.sort_unstable();

    let lower_value = quantile(&counts, lower / 100.0);
    let upper_value = quantile(&counts, upper / 100.0);

    for bin in bins.values_mut() {
        #[allow(clippy::cast_precision_loss)]
        let count = bin.count() as f64;
        bin.visible = count >= lower_value && count <= upper_value;
    }
}

/// Linear-interpolated quantile of an ascending slice, `p` in `[0, 1]`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn quantile(sorted: &[usize], p: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only as f64,
        _ => {
            let pos = (sorted.len() - 1) as f64 * p;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(sorted.len() - 1);
            let lo_value = sorted[lo] as f64;
            (sorted[hi] as f64 - lo_value).mul_add(pos - lo as f64, lo_value)
        }
    }
}

/// Degree-space envelopes covering a `radius_m` circle around `point`,
/// split at the antimeridian.
fn degree_envelopes(point: GeoPoint, radius_m: f64) -> Vec<AABB<[f64; 2]>> {
    let dlat = radius_m / METERS_PER_DEGREE * ENVELOPE_SLACK;
    let cos_lat = point.latitude.to_radians().cos().abs();
    let dlng = if cos_lat < 1e-9 {
        180.0
    } else {
        (dlat / cos_lat).min(180.0)
    };

    let min_lat = point.latitude - dlat;
    let max_lat = point.latitude + dlat;
    let min_lng = point.longitude - dlng;
    let max_lng = point.longitude + dlng;

    let mut envelopes = vec![AABB::from_corners([min_lng, min_lat], [max_lng, max_lat])];
    if min_lng < -180.0 {
        envelopes.push(AABB::from_corners(
            [min_lng + 360.0, min_lat],
            [180.0, max_lat],
        ));
    }
    if max_lng > 180.0 {
        envelopes.push(AABB::from_corners(
            [-180.0, min_lat],
            [max_lng - 360.0, max_lat],
        ));
    }
    envelopes
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn record(id: &str, lng: f64, lat: f64) -> EventRecord {
        EventRecord::new(id, lng, lat, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(), 1)
    }

    fn layer(records: Vec<EventRecord>, params: &HexBinParams) -> HexLayer {
        HexLayer::build(records.into(), params)
    }

    #[test]
    fn resolution_tracks_radius() {
        let coarse = resolution_for_radius(20_000.0);
        let fine = resolution_for_radius(100.0);
        assert!(u8::from(coarse) < u8::from(fine));
        assert_eq!(resolution_for_radius(0.0), Resolution::Fifteen);
        assert_eq!(resolution_for_radius(f64::NAN), Resolution::Fifteen);
        assert_eq!(resolution_for_radius(f64::INFINITY), Resolution::Zero);
    }

    #[test]
    fn co_located_records_share_a_bin() {
        let layer = layer(
            vec![
                record("a", 31.0, 48.0),
                record("b", 31.0, 48.0),
                record("c", 36.0, 50.0),
            ],
            &HexBinParams::default(),
        );

        assert_eq!(layer.bins().count(), 2);
        let hit = layer.bin_at(GeoPoint::new(31.0, 48.0)).unwrap();
        assert_eq!(hit.count(), 2);
        let ids: Vec<&str> = layer.members(hit.cell).map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn miss_outside_data_extent() {
        let layer = layer(vec![record("a", 31.0, 48.0)], &HexBinParams::default());
        assert!(layer.bin_at(GeoPoint::new(-70.0, 10.0)).is_none());
        assert!(layer.tooltip(GeoPoint::new(-70.0, 10.0)).is_none());
    }

    #[test]
    fn unplaceable_records_are_counted() {
        let layer = layer(
            vec![record("a", 31.0, 48.0), record("nan", f64::NAN, 48.0)],
            &HexBinParams::default(),
        );
        assert_eq!(layer.unplaced(), 1);
        assert_eq!(layer.bins().count(), 1);
    }

    #[test]
    fn radius_query_uses_centroid_distance() {
        let layer = layer(
            vec![
                record("near", 31.0, 48.0),
                record("mid", 31.0, 48.5),
                record("far", 31.0, 52.0),
            ],
            &HexBinParams::default(),
        );

        let origin = GeoPoint::new(31.0, 48.0);
        let within_100km = layer.bins_within(origin, 100_000.0);
        let total: usize = within_100km.iter().map(|b| b.count()).sum();
        assert_eq!(total, 2);

        for bin in &within_100km {
            assert!(origin.haversine_distance_m(bin.centroid()) <= 100_000.0);
        }

        assert!(layer.bins_within(origin, 0.0).is_empty());
        assert!(layer.bins_within(origin, f64::NAN).is_empty());
    }

    #[test]
    fn radius_query_crosses_antimeridian() {
        let layer = layer(
            vec![record("east", 179.95, 0.0), record("west", -179.95, 0.0)],
            &HexBinParams {
                radius_m: 1_000.0,
                ..HexBinParams::default()
            },
        );
        let hits = layer.bins_within(GeoPoint::new(179.99, 0.0), 50_000.0);
        let total: usize = hits.iter().map(|b| b.count()).sum();
        assert_eq!(total, 2);
    }

    #[test]
    fn percentile_range_hides_outliers() {
        let mut records = Vec::new();
        for i in 0..10 {
            records.push(record(&format!("dense{i}"), 31.0, 48.0));
        }
        records.push(record("sparse1", 34.0, 49.0));
        records.push(record("sparse2", 36.0, 50.0));

        let layer = layer(
            records,
            &HexBinParams {
                percentile_range: [0.0, 50.0],
                ..HexBinParams::default()
            },
        );

        assert_eq!(layer.bins().count(), 3);
        assert_eq!(layer.visible_bins().count(), 2);
        assert!(layer.bin_at(GeoPoint::new(31.0, 48.0)).is_none());
        assert!(layer.pick_within(GeoPoint::new(31.0, 48.0), 1_000.0).is_empty());
    }

    #[test]
    fn low_coverage_shrinks_pick_area() {
        let full = layer(vec![record("a", 31.0, 48.0)], &HexBinParams::default());
        let bin = full.bins().next().unwrap().clone();

        let shrunk = layer(
            vec![record("a", 31.0, 48.0)],
            &HexBinParams {
                coverage: 0.0,
                ..HexBinParams::default()
            },
        );

        // Exactly on the centroid still hits; a point a few km off does not.
        assert!(shrunk.bin_at(bin.centroid()).is_some());
        let off_center = GeoPoint::new(bin.centroid_lng + 0.03, bin.centroid_lat);
        assert_eq!(full.pick_point(off_center), Some(bin.cell));
        assert!(shrunk.pick_point(off_center).is_none());
    }

    #[test]
    fn tooltip_format() {
        let layer = layer(
            vec![record("a", 31.0, 48.0), record("b", 31.0, 48.0)],
            &HexBinParams::default(),
        );
        let text = layer.tooltip(GeoPoint::new(31.0, 48.0)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("latitude: 4"));
        assert!(lines[1].starts_with("longitude: 3"));
        assert_eq!(lines[2], "Event Count: 2");
    }

    #[test]
    fn elevation_scale_flat_when_empty() {
        let empty = layer(Vec::new(), &HexBinParams::default());
        assert!(empty.elevation_scale().abs() < f64::EPSILON);
        let full = layer(vec![record("a", 31.0, 48.0)], &HexBinParams::default());
        assert!((full.elevation_scale() - ELEVATION_SCALE).abs() < f64::EPSILON);
    }

    #[test]
    fn feature_collection_has_closed_rings() {
        let layer = layer(vec![record("a", 31.0, 48.0)], &HexBinParams::default());
        let fc = layer.to_feature_collection();
        assert_eq!(fc.features.len(), 1);

        let geometry = fc.features[0].geometry.as_ref().unwrap();
        let geojson::Value::Polygon(rings) = &geometry.value else {
            panic!("expected polygon");
        };
        let ring = &rings[0];
        assert_eq!(ring.first(), ring.last());
        assert_eq!(
            fc.features[0].properties.as_ref().unwrap()["count"],
            serde_json::Value::from(1)
        );
    }

    #[test]
    fn quantile_interpolates() {
        assert!((quantile(&[1, 2, 3, 4], 0.5) - 2.5).abs() < 1e-9);
        assert!((quantile(&[5], 0.9) - 5.0).abs() < 1e-9);
        assert!((quantile(&[1, 10], 1.0) - 10.0).abs() < 1e-9);
    }
}
