#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Conflict event feeds and their normalization.
//!
//! Every feed (CSV export or ACLED API payload) goes through the same
//! [`FieldMapping`] normalization and comes out as [`EventRecord`]s. Rows
//! that cannot be placed on the map or on the timeline are skipped and
//! counted, never fatal.

pub mod csv_file;
pub mod json;
pub mod parsing;
pub mod progress;
pub mod registry;
pub mod source_def;

pub use csv_file::{load_csv_events, load_csv_events_with, load_csv_file};
pub use json::{load_json_events, load_json_events_with};
pub use source_def::{FieldMapping, RowIssue, SourceDefinition};

use conflict_map_event_models::EventRecord;

/// Errors that can occur while loading a feed.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// CSV parsing failed.
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The feed has an unexpected shape.
    #[error("Normalization error: {message}")]
    Normalization {
        /// Description of what went wrong.
        message: String,
    },
}

/// Row counts of one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Rows that became records.
    pub loaded: u64,
    /// Rows skipped for unusable coordinates or dates.
    pub skipped: u64,
}

/// The records of one feed plus its [`LoadReport`].
#[derive(Debug, Clone, Default)]
pub struct LoadedEvents {
    /// Normalized records, in feed order.
    pub records: Vec<EventRecord>,
    /// Row counts.
    pub report: LoadReport,
}
