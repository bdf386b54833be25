//! ACLED API payload loader.
//!
//! The API wraps rows in `{ "data": [...] }`; saved exports are often the
//! bare array. Both are accepted, with string or numeric field values.

use std::io::Read;

use crate::progress::{NullProgress, ProgressCallback};
use crate::source_def::FieldMapping;
use crate::{LoadReport, LoadedEvents, SourceError};

/// Loads events from an ACLED JSON payload with ACLED field names.
///
/// # Errors
///
/// Returns [`SourceError`] if the input is not JSON or is neither an array
/// nor an object with a `data` array.
pub fn load_json_events<R: Read>(reader: R) -> Result<LoadedEvents, SourceError> {
    load_json_events_with(reader, &FieldMapping::default(), "json", &NullProgress)
}

/// Loads events from a JSON payload using `fields` for field names. `label`
/// prefixes log lines.
///
/// The row count is known once the payload is parsed, so `progress` gets a
/// total before any row is normalized.
///
/// # Errors
///
/// Returns [`SourceError`] if the input is not JSON or is neither an array
/// nor an object with a `data` array.
pub fn load_json_events_with<R: Read>(
    reader: R,
    fields: &FieldMapping,
    label: &str,
    progress: &dyn ProgressCallback,
) -> Result<LoadedEvents, SourceError> {
    let payload: serde_json::Value = serde_json::from_reader(reader)?;

    let rows = match &payload {
        serde_json::Value::Array(rows) => rows,
        serde_json::Value::Object(obj) => obj
            .get("data")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| SourceError::Normalization {
                message: "JSON object has no \"data\" array".to_string(),
            })?,
        _ => {
            return Err(SourceError::Normalization {
                message: "JSON payload is neither an array nor an object".to_string(),
            });
        }
    };

    progress.set_message(label.to_string());
    progress.set_total(rows.len() as u64);

    let mut records = Vec::with_capacity(rows.len());
    let mut report = LoadReport::default();

    for (i, row) in rows.iter().enumerate() {
        let row_number = i as u64 + 1;
        match fields.normalize(row, row_number) {
            Ok(record) => {
                records.push(record);
                report.loaded += 1;
            }
            Err(issue) => {
                log::warn!("[{label}] Skipping row {row_number}: {issue}");
                report.skipped += 1;
            }
        }
        progress.inc(1);
    }

    log::info!(
        "[{label}] Loaded {} events ({} rows skipped)",
        report.loaded,
        report.skipped
    );
    progress.finish(format!("[{label}] {} events", report.loaded));

    Ok(LoadedEvents { records, report })
}
