//! Loading both datasets for a CLI run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use conflict_map_cli_utils::{IndicatifProgress, MultiProgress};
use conflict_map_event_models::{EventCategory, EventRecord};
use conflict_map_source::registry::source_for;
use conflict_map_source::SourceError;

/// Where each dataset is read from.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Directory holding the registered default files.
    pub data_dir: PathBuf,
    /// Per-category overrides.
    pub overrides: BTreeMap<EventCategory, PathBuf>,
}

/// Loads every category. A dataset that fails to load is logged and
/// treated as empty.
///
/// # Errors
///
/// Returns [`SourceError`] only if the embedded source registry is broken.
pub fn load_datasets(
    paths: &DataPaths,
    multi: &MultiProgress,
) -> Result<BTreeMap<EventCategory, Vec<EventRecord>>, SourceError> {
    let overall = IndicatifProgress::datasets_bar(
        multi,
        "Loading datasets",
        EventCategory::all().len() as u64,
    );
    let mut datasets = BTreeMap::new();

    for category in EventCategory::all() {
        let Some(source) = source_for(*category)? else {
            log::warn!("No source registered for {category}");
            datasets.insert(*category, Vec::new());
            continue;
        };

        let path = paths
            .overrides
            .get(category)
            .cloned()
            .unwrap_or_else(|| paths.data_dir.join(&source.file_name));

        let rows = IndicatifProgress::rows_bar(multi, &source.id);
        let loaded = match paths.overrides.get(category) {
            Some(path) => source.load_file(path, rows.as_ref()),
            None => source.load_from_dir(&paths.data_dir, rows.as_ref()),
        };
        let records = match loaded {
            Ok(loaded) => {
                if loaded.report.skipped > 0 {
                    log::warn!(
                        "[{}] {} rows skipped from {}",
                        source.id,
                        loaded.report.skipped,
                        path.display()
                    );
                }
                loaded.records
            }
            Err(e) => {
                log::warn!(
                    "[{}] Failed to load {}: {e}; continuing without {category}",
                    source.id,
                    path.display()
                );
                rows.finish(format!("[{}] unavailable", source.id));
                Vec::new()
            }
        };

        datasets.insert(*category, records);
        overall.inc(1);
    }

    overall.finish("Datasets loaded".to_string());
    Ok(datasets)
}
