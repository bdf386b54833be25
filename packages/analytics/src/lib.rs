#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations over conflict event selections.
//!
//! All functions here are pure: they take borrowed records and return owned
//! results, with no dependency on prior calls. Empty input is a normal state
//! (nothing selected yet) and yields zeroed results rather than errors.

pub mod chart;
pub mod series;
pub mod statistics;

pub use chart::prepare_chart;
pub use series::{aggregate_by_date, aggregate_categories_by_date};
pub use statistics::{DEFAULT_DATE_FORMAT, compute_statistics, compute_statistics_with_format};
