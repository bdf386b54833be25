//! CSV event loader.
//!
//! Each row becomes a JSON object keyed by header, so CSV and JSON feeds
//! share one normalization path ([`FieldMapping::normalize`]).

use std::io::Read;
use std::path::Path;

use crate::progress::ProgressCallback;
use crate::source_def::FieldMapping;
use crate::{LoadReport, LoadedEvents, SourceError};

/// Rows between progress updates.
const PROGRESS_BATCH: u64 = 1_000;

/// Loads events from CSV with ACLED column names.
///
/// # Errors
///
/// Returns [`SourceError`] if the input is not readable CSV or has no
/// header row.
pub fn load_csv_events<R: Read>(
    reader: R,
    progress: &dyn ProgressCallback,
) -> Result<LoadedEvents, SourceError> {
    load_csv_events_with(reader, &FieldMapping::default(), "csv", progress)
}

/// Loads events from a CSV file with ACLED column names.
///
/// # Errors
///
/// Returns [`SourceError`] if the file cannot be opened or parsed.
pub fn load_csv_file(
    path: &Path,
    progress: &dyn ProgressCallback,
) -> Result<LoadedEvents, SourceError> {
    let file = std::fs::File::open(path)?;
    let label = path
        .file_name()
        .map_or_else(|| "csv".to_string(), |n| n.to_string_lossy().into_owned());
    load_csv_events_with(file, &FieldMapping::default(), &label, progress)
}

/// Loads events from CSV using `fields` for column names. `label` prefixes
/// log lines.
///
/// Rows with unusable coordinates or dates are skipped and counted in the
/// returned [`LoadReport`]; malformed CSV aborts the load.
///
/// # Errors
///
/// Returns [`SourceError`] if the input is not readable CSV or has no
/// header row.
pub fn load_csv_events_with<R: Read>(
    reader: R,
    fields: &FieldMapping,
    label: &str,
    progress: &dyn ProgressCallback,
) -> Result<LoadedEvents, SourceError> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let csv_headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_owned())
        .collect();

    if csv_headers.iter().all(String::is_empty) {
        return Err(SourceError::Normalization {
            message: format!("[{label}] CSV input contains no header row"),
        });
    }

    progress.set_message(label.to_string());

    let mut records = Vec::new();
    let mut report = LoadReport::default();
    let mut pending: u64 = 0;

    for (i, result) in reader.records().enumerate() {
        let row = result?;
        let row_number = i as u64 + 1;

        let mut map = serde_json::Map::new();
        for (col, header) in csv_headers.iter().enumerate() {
            let value = row.get(col).unwrap_or("").trim().to_owned();
            map.insert(header.clone(), serde_json::Value::String(value));
        }

        match fields.normalize(&serde_json::Value::Object(map), row_number) {
            Ok(record) => {
                records.push(record);
                report.loaded += 1;
            }
            Err(issue) => {
                log::warn!("[{label}] Skipping row {row_number}: {issue}");
                report.skipped += 1;
            }
        }

        pending += 1;
        if pending == PROGRESS_BATCH {
            progress.inc(pending);
            pending = 0;
        }
    }
    progress.inc(pending);

    log::info!(
        "[{label}] Loaded {} events ({} rows skipped)",
        report.loaded,
        report.skipped
    );
    progress.finish(format!("[{label}] {} events", report.loaded));

    Ok(LoadedEvents { records, report })
}
