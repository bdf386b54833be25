//! Config-driven conflict dataset definition.
//!
//! [`SourceDefinition`] captures everything unique about one dataset (its
//! category, default file, upstream URL and column names) so a single
//! generic loader handles every feed.

use std::path::Path;

use conflict_map_event_models::{EventCategory, EventRecord};
use serde::{Deserialize, Serialize};

use crate::parsing::{parse_coordinate, parse_event_date_value, parse_fatalities};
use crate::progress::ProgressCallback;
use crate::{LoadedEvents, SourceError};

/// A conflict dataset, loaded from an embedded TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Unique identifier (e.g., `"acled_battles"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Category every record of this dataset belongs to.
    pub category: EventCategory,
    /// Default local file name of the CSV export.
    pub file_name: String,
    /// Where the CSV export is published. Carried as metadata only.
    pub url: String,
    /// Attribution for the dataset.
    pub license: LicenseInfo,
    /// Column names for normalization.
    #[serde(default)]
    pub fields: FieldMapping,
}

/// Attribution metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseInfo {
    /// Who must be credited when the data is shown.
    pub attribution: String,
    /// Landing page of the data provider.
    #[serde(default)]
    pub portal_url: Option<String>,
}

/// Column names of a feed. Defaults match ACLED exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMapping {
    /// Candidate id columns, first non-empty wins.
    pub event_id: Vec<String>,
    /// Longitude column.
    pub longitude: String,
    /// Latitude column.
    pub latitude: String,
    /// Event date column.
    pub event_date: String,
    /// Fatalities column.
    pub fatalities: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            event_id: vec!["event_id_cnty".to_string(), "event_id".to_string()],
            longitude: "longitude".to_string(),
            latitude: "latitude".to_string(),
            event_date: "event_date".to_string(),
            fatalities: "fatalities".to_string(),
        }
    }
}

/// Why a raw row did not become an [`EventRecord`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowIssue {
    /// Longitude or latitude missing, unparseable or not finite.
    #[error("unusable coordinates")]
    Coordinates,
    /// Event date missing or in an unknown format.
    #[error("unusable event date")]
    EventDate,
}

impl FieldMapping {
    /// Normalizes one raw row into an [`EventRecord`].
    ///
    /// `row` is the 1-based position of the row in its feed. It becomes the
    /// id when none of the id columns has a value, so id-less rows stay
    /// distinct.
    ///
    /// # Errors
    ///
    /// Returns a [`RowIssue`] when the coordinates or the date are unusable.
    pub fn normalize(&self, record: &serde_json::Value, row: u64) -> Result<EventRecord, RowIssue> {
        let longitude = record
            .get(&self.longitude)
            .and_then(parse_coordinate)
            .ok_or(RowIssue::Coordinates)?;
        let latitude = record
            .get(&self.latitude)
            .and_then(parse_coordinate)
            .ok_or(RowIssue::Coordinates)?;
        let event_date = record
            .get(&self.event_date)
            .and_then(parse_event_date_value)
            .ok_or(RowIssue::EventDate)?;
        let fatalities = record
            .get(&self.fatalities)
            .map_or(0, parse_fatalities);

        let id = extract_event_id(record, &self.event_id).unwrap_or_else(|| format!("row-{row}"));

        Ok(EventRecord::new(
            id, longitude, latitude, event_date, fatalities,
        ))
    }
}

/// Returns the first non-empty id among `fields`.
fn extract_event_id(record: &serde_json::Value, fields: &[String]) -> Option<String> {
    for field in fields {
        if let Some(s) = record.get(field).and_then(serde_json::Value::as_str)
            && !s.trim().is_empty()
        {
            return Some(s.trim().to_string());
        }
        // The ACLED API returns numeric ids for some exports.
        if let Some(n) = record.get(field).and_then(serde_json::Value::as_i64) {
            return Some(n.to_string());
        }
    }
    None
}

impl SourceDefinition {
    /// Loads this dataset's default file from `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be opened or parsed.
    pub fn load_from_dir(
        &self,
        dir: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<LoadedEvents, SourceError> {
        self.load_file(&dir.join(&self.file_name), progress)
    }

    /// Loads `path` with this dataset's field mapping. A `.json` extension
    /// selects the API payload loader, anything else is read as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the file cannot be opened or parsed.
    pub fn load_file(
        &self,
        path: &Path,
        progress: &dyn ProgressCallback,
    ) -> Result<LoadedEvents, SourceError> {
        log::info!("[{}] Loading {}", self.id, path.display());
        let file = std::fs::File::open(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            crate::json::load_json_events_with(
                std::io::BufReader::new(file),
                &self.fields,
                &self.id,
                progress,
            )
        } else {
            crate::csv_file::load_csv_events_with(file, &self.fields, &self.id, progress)
        }
    }
}

/// Parses a [`SourceDefinition`] from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or missing required fields.
pub fn parse_source_toml(toml_str: &str) -> Result<SourceDefinition, String> {
    toml::de::from_str(toml_str).map_err(|e| e.to_string())
}
