//! Where published [`DashboardUpdate`]s go.

use conflict_map_dashboard_models::DashboardUpdate;
use tokio::sync::mpsc;

/// Receives every update the controller publishes, in publication order.
///
/// An update is delivered whole: statistics for every category and the
/// series arrive together, never piecemeal.
pub trait PresentationSink {
    /// Presents `update`.
    fn publish(&mut self, update: &DashboardUpdate);
}

/// Logs a one-line summary of every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl PresentationSink for LogSink {
    fn publish(&mut self, update: &DashboardUpdate) {
        let per_category = update
            .statistics
            .iter()
            .map(|(category, stats)| format!("{category}={}", stats.event_count))
            .collect::<Vec<_>>()
            .join(", ");

        log::info!(
            "Update #{} (config v{}): {per_category}, {} series days",
            update.sequence,
            update.config_version,
            update.series.len()
        );
    }
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn publish(&mut self, _update: &DashboardUpdate) {}
}

/// Forwards a clone of every update over an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DashboardUpdate>,
}

impl ChannelSink {
    /// Creates a sink and the receiver its updates arrive on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DashboardUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PresentationSink for ChannelSink {
    fn publish(&mut self, update: &DashboardUpdate) {
        if self.tx.send(update.clone()).is_err() {
            log::debug!("Update #{} dropped: receiver closed", update.sequence);
        }
    }
}

impl<S: PresentationSink + ?Sized> PresentationSink for Box<S> {
    fn publish(&mut self, update: &DashboardUpdate) {
        (**self).publish(update);
    }
}
