//! Resolution of an interaction point into the set of selected events.
//!
//! Every call builds its result from scratch. Nothing carries over between
//! interactions, so a selection always matches the bins currently on screen
//! even after the bin or brushing radius changes.

use std::collections::BTreeSet;

use conflict_map_event_models::EventRecord;

use crate::{BinSource, GeoPoint};

/// How an interaction point selects bins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionMode {
    /// The single bin under the point.
    SinglePoint,
    /// Every bin whose centroid is within `radius_m` metres of the point.
    Area {
        /// Brushing radius in metres.
        radius_m: f64,
    },
}

/// Events selected by one interaction, deduplicated by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionResult<'a> {
    records: Vec<&'a EventRecord>,
}

impl<'a> SelectionResult<'a> {
    /// An empty selection.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Builds a selection, keeping the first occurrence of every id.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        let mut seen: BTreeSet<&'a str> = BTreeSet::new();
        let records = records
            .into_iter()
            .filter(|record| seen.insert(record.id.as_str()))
            .collect();
        Self { records }
    }

    /// The selected records.
    #[must_use]
    pub fn records(&self) -> &[&'a EventRecord] {
        &self.records
    }

    /// Iterates the selected records.
    pub fn iter(&self) -> impl Iterator<Item = &'a EventRecord> + '_ {
        self.records.iter().copied()
    }

    /// Number of selected records.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Resolves the events under `point` for the given `mode`.
///
/// A miss (no bin under the point, nothing within the radius) is an empty
/// selection, not an error.
#[must_use]
pub fn resolve_selection<B: BinSource>(
    point: GeoPoint,
    mode: SelectionMode,
    bins: &B,
) -> SelectionResult<'_> {
    let picked = match mode {
        SelectionMode::SinglePoint => bins.pick_point(point).into_iter().collect(),
        SelectionMode::Area { radius_m } => bins.pick_within(point, radius_m),
    };

    if picked.is_empty() {
        log::trace!("No bins picked at ({}, {})", point.longitude, point.latitude);
        return SelectionResult::empty();
    }

    let selection =
        SelectionResult::from_records(picked.into_iter().flat_map(|bin| bins.members(bin)));

    log::trace!(
        "Resolved {} events at ({}, {}) with {mode:?}",
        selection.len(),
        point.longitude,
        point.latitude
    );

    selection
}
