//! Load progress reporting.
//!
//! Loaders report rows read through [`ProgressCallback`] so the CLI can draw
//! an `indicatif` bar while library callers and tests stay silent with
//! [`NullProgress`].

/// Receives row-level progress from a loader.
///
/// `Send + Sync` so one reporter can be shared by loaders running on
/// blocking worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Total rows expected, once the loader knows it (JSON payloads).
    fn set_total(&self, total: u64);

    /// Advance by `delta` rows.
    fn inc(&self, delta: u64);

    /// Label for the dataset currently loading.
    fn set_message(&self, msg: String);

    /// Loading finished; `msg` summarizes the outcome.
    fn finish(&self, msg: String);
}

/// Ignores every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}
