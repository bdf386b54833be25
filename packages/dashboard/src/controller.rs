//! The interaction controller.
//!
//! An interaction runs in three steps so its resolution can happen off the
//! controller's thread:
//!
//! 1. [`InteractionController::begin_interaction`] issues a [`Ticket`] and
//!    captures the current layers and config in a [`PendingInteraction`].
//! 2. [`PendingInteraction::resolve`] selects, aggregates and builds the
//!    series. It touches no controller state.
//! 3. [`InteractionController::complete`] publishes the result only if its
//!    ticket is still current: no later interaction was begun and the
//!    config did not change. Anything else is dropped.
//!
//! [`InteractionController::interact`] runs all three with the resolution
//! on a blocking worker.

use std::collections::BTreeMap;
use std::sync::Arc;

use conflict_map_analytics::{aggregate_categories_by_date, compute_statistics_with_format};
use conflict_map_analytics_models::{DateSeriesPoint, Statistics};
use conflict_map_dashboard_models::{DashboardConfig, DashboardUpdate, InitialScope, Interaction};
use conflict_map_event_models::{EventCategory, EventRecord};
use conflict_map_spatial::{GeoPoint, SelectionMode, resolve_selection};

use crate::DashboardError;
use crate::layers::LayerSet;
use crate::sink::PresentationSink;

/// Identifies one interaction and the config it was issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket {
    /// Monotonically increasing per controller, starting at 1.
    pub sequence: u64,
    /// Config version current when the interaction began.
    pub config_version: u64,
}

/// Whether the controller is waiting on a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Nothing in flight.
    Idle,
    /// Waiting for the interaction with this sequence number. Results for
    /// any other sequence are stale.
    Recomputing {
        /// Sequence of the latest interaction.
        sequence: u64,
    },
}

/// An interaction captured with everything needed to resolve it.
///
/// Owns `Arc` snapshots of the layers and config, so it can be moved to
/// another thread and resolved while the controller keeps accepting
/// interactions.
pub struct PendingInteraction {
    ticket: Ticket,
    interaction: Interaction,
    layers: Arc<LayerSet>,
    config: Arc<DashboardConfig>,
}

/// The outcome of [`PendingInteraction::resolve`], not yet published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInteraction {
    ticket: Ticket,
    statistics: BTreeMap<EventCategory, Statistics>,
    series: Vec<DateSeriesPoint>,
}

impl ResolvedInteraction {
    /// The ticket of the interaction this answers.
    #[must_use]
    pub const fn ticket(&self) -> Ticket {
        self.ticket
    }

    fn into_update(self) -> DashboardUpdate {
        DashboardUpdate {
            sequence: self.ticket.sequence,
            config_version: self.ticket.config_version,
            statistics: self.statistics,
            series: self.series,
        }
    }
}

impl PendingInteraction {
    /// The ticket issued for this interaction.
    #[must_use]
    pub const fn ticket(&self) -> Ticket {
        self.ticket
    }

    /// Selects the events under the interaction point in every visible
    /// layer, then computes per-category statistics and the combined date
    /// series.
    ///
    /// Hidden categories get empty statistics and contribute zeros to the
    /// series. The result depends only on the captured snapshot, so the
    /// same interaction over the same data and config always resolves to
    /// the same value.
    #[must_use]
    pub fn resolve(self) -> ResolvedInteraction {
        let point = GeoPoint::new(self.interaction.longitude, self.interaction.latitude);
        let mode = selection_mode(&self.config);
        let date_format = self.config.display.date_format.as_str();

        let mut selected: Vec<(EventCategory, Vec<&EventRecord>)> = Vec::new();
        for category in EventCategory::all() {
            let records = self
                .layers
                .visible_layer(*category)
                .map(|layer| resolve_selection(point, mode, layer).records().to_vec())
                .unwrap_or_default();
            log::debug!(
                "Interaction #{}: {} {category} events selected",
                self.ticket.sequence,
                records.len()
            );
            selected.push((*category, records));
        }

        let statistics = selected
            .iter()
            .map(|(category, records)| {
                (
                    *category,
                    compute_statistics_with_format(records.iter().copied(), date_format),
                )
            })
            .collect();

        let series = aggregate_categories_by_date(
            selected
                .iter()
                .map(|(category, records)| (*category, records.iter().copied())),
        );

        ResolvedInteraction {
            ticket: self.ticket,
            statistics,
            series,
        }
    }
}

/// Owns the datasets, the versioned config and the layers built from them,
/// and publishes one [`DashboardUpdate`] per completed interaction.
pub struct InteractionController<S: PresentationSink> {
    datasets: BTreeMap<EventCategory, Arc<[EventRecord]>>,
    config: Arc<DashboardConfig>,
    config_version: u64,
    layers: Arc<LayerSet>,
    next_sequence: u64,
    state: ControllerState,
    last_update: Option<DashboardUpdate>,
    sink: S,
}

impl<S: PresentationSink> InteractionController<S> {
    /// Creates a controller over `datasets`. Categories missing from
    /// `datasets` are treated as empty.
    #[must_use]
    pub fn new<D>(datasets: D, config: DashboardConfig, sink: S) -> Self
    where
        D: IntoIterator<Item = (EventCategory, Vec<EventRecord>)>,
    {
        let mut by_category: BTreeMap<EventCategory, Vec<EventRecord>> = EventCategory::all()
            .iter()
            .map(|category| (*category, Vec::new()))
            .collect();
        for (category, records) in datasets {
            by_category.entry(category).or_default().extend(records);
        }
        let datasets: BTreeMap<EventCategory, Arc<[EventRecord]>> = by_category
            .into_iter()
            .map(|(category, records)| (category, Arc::from(records)))
            .collect();

        let layers = Arc::new(LayerSet::build(&datasets, &config, 0));

        Self {
            datasets,
            config: Arc::new(config),
            config_version: 0,
            layers,
            next_sequence: 1,
            state: ControllerState::Idle,
            last_update: None,
            sink,
        }
    }

    /// The current config.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Incremented by every [`Self::update_config`].
    #[must_use]
    pub const fn config_version(&self) -> u64 {
        self.config_version
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> ControllerState {
        self.state
    }

    /// The layers for the current config.
    #[must_use]
    pub const fn layers(&self) -> &Arc<LayerSet> {
        &self.layers
    }

    /// The records loaded for `category`.
    #[must_use]
    pub fn records(&self, category: EventCategory) -> &[EventRecord] {
        self.datasets
            .get(&category)
            .map(|records| &**records)
            .unwrap_or_default()
    }

    /// The most recently published update.
    #[must_use]
    pub const fn last_update(&self) -> Option<&DashboardUpdate> {
        self.last_update.as_ref()
    }

    /// The sink updates are published to.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Starts an interaction and returns it for resolution.
    ///
    /// Any interaction still in flight becomes stale.
    pub fn begin_interaction(&mut self, interaction: Interaction) -> PendingInteraction {
        let ticket = Ticket {
            sequence: self.next_sequence,
            config_version: self.config_version,
        };
        self.next_sequence += 1;

        if let ControllerState::Recomputing { sequence } = self.state {
            log::debug!("Interaction #{} supersedes #{sequence}", ticket.sequence);
        }
        self.state = ControllerState::Recomputing {
            sequence: ticket.sequence,
        };

        PendingInteraction {
            ticket,
            interaction,
            layers: Arc::clone(&self.layers),
            config: Arc::clone(&self.config),
        }
    }

    /// Publishes `resolved` if its ticket is still current.
    ///
    /// Returns the published update, or `None` when the result was stale
    /// and dropped.
    pub fn complete(&mut self, resolved: ResolvedInteraction) -> Option<DashboardUpdate> {
        let ticket = resolved.ticket;

        let latest = match self.state {
            ControllerState::Recomputing { sequence } => Some(sequence),
            ControllerState::Idle => None,
        };
        if latest != Some(ticket.sequence) {
            log::debug!(
                "Dropping stale result #{} (latest {latest:?})",
                ticket.sequence
            );
            return None;
        }
        if ticket.config_version != self.config_version {
            log::debug!(
                "Dropping result #{} computed under config v{} (current v{})",
                ticket.sequence,
                ticket.config_version,
                self.config_version
            );
            return None;
        }

        self.state = ControllerState::Idle;
        let update = resolved.into_update();
        self.publish(update.clone());
        Some(update)
    }

    /// Runs a full interaction, resolving it on a blocking worker.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Join`] if the resolution task panicked.
    pub async fn interact(
        &mut self,
        interaction: Interaction,
    ) -> Result<Option<DashboardUpdate>, DashboardError> {
        let pending = self.begin_interaction(interaction);
        let resolved = tokio::task::spawn_blocking(move || pending.resolve()).await?;
        Ok(self.complete(resolved))
    }

    /// Applies `change` to the config, rebuilds the layers and bumps the
    /// config version.
    ///
    /// Any interaction in flight is superseded. Nothing is republished; the
    /// next interaction sees the new config.
    pub fn update_config<F>(&mut self, change: F)
    where
        F: FnOnce(&mut DashboardConfig),
    {
        let mut config = (*self.config).clone();
        change(&mut config);

        self.config_version += 1;
        self.layers = Arc::new(LayerSet::build(
            &self.datasets,
            &config,
            self.config_version,
        ));
        self.config = Arc::new(config);

        if let ControllerState::Recomputing { sequence } = self.state {
            log::debug!(
                "Config v{} supersedes in-flight interaction #{sequence}",
                self.config_version
            );
        }
        self.state = ControllerState::Idle;

        log::info!("Config updated to v{}", self.config_version);
    }

    /// Publishes what the panels show before any interaction.
    ///
    /// With [`InitialScope::Empty`] every category has empty statistics and
    /// the series is empty. With [`InitialScope::FullDataset`] both cover
    /// every loaded event of the visible categories.
    pub fn initial_update(&mut self) -> DashboardUpdate {
        let date_format = self.config.display.date_format.as_str();

        let update = match self.config.initial_scope {
            InitialScope::Empty => DashboardUpdate {
                sequence: 0,
                config_version: self.config_version,
                statistics: EventCategory::all()
                    .iter()
                    .map(|category| (*category, Statistics::empty()))
                    .collect(),
                series: Vec::new(),
            },
            InitialScope::FullDataset => {
                let scoped: Vec<(EventCategory, &[EventRecord])> = EventCategory::all()
                    .iter()
                    .map(|category| {
                        let records = if self.layers.is_visible(*category) {
                            self.records(*category)
                        } else {
                            &[]
                        };
                        (*category, records)
                    })
                    .collect();

                DashboardUpdate {
                    sequence: 0,
                    config_version: self.config_version,
                    statistics: scoped
                        .iter()
                        .map(|(category, records)| {
                            (
                                *category,
                                compute_statistics_with_format(records.iter(), date_format),
                            )
                        })
                        .collect(),
                    series: aggregate_categories_by_date(
                        scoped
                            .iter()
                            .map(|(category, records)| (*category, records.iter())),
                    ),
                }
            }
        };

        self.publish(update.clone());
        update
    }

    /// Hover text per visible category at a point. Does not change state.
    #[must_use]
    pub fn tooltip(&self, longitude: f64, latitude: f64) -> BTreeMap<EventCategory, String> {
        self.layers.tooltips(GeoPoint::new(longitude, latitude))
    }

    fn publish(&mut self, update: DashboardUpdate) {
        self.sink.publish(&update);
        self.last_update = Some(update);
    }
}

/// Area selection when brushing is on, else the single bin under the point.
fn selection_mode(config: &DashboardConfig) -> SelectionMode {
    if config.brushing.enabled {
        SelectionMode::Area {
            radius_m: config.brushing.radius_m,
        }
    } else {
        SelectionMode::SinglePoint
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use conflict_map_analytics_models::NOT_AVAILABLE;

    use super::*;
    use crate::sink::ChannelSink;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, d).unwrap()
    }

    /// Two battles and one explosion at Donetsk, one battle at Kharkiv.
    fn datasets() -> Vec<(EventCategory, Vec<EventRecord>)> {
        vec![
            (
                EventCategory::Battles,
                vec![
                    EventRecord::new("b1", 37.80, 48.00, day(1), 2),
                    EventRecord::new("b2", 37.80, 48.00, day(3), 6),
                    EventRecord::new("b3", 36.23, 49.99, day(2), 1),
                ],
            ),
            (
                EventCategory::Explosions,
                vec![EventRecord::new("e1", 37.80, 48.00, day(3), 0)],
            ),
        ]
    }

    const DONETSK: Interaction = Interaction::new(37.80, 48.00);
    const KHARKIV: Interaction = Interaction::new(36.23, 49.99);
    const OPEN_SEA: Interaction = Interaction::new(-30.0, 0.0);

    fn controller() -> (
        InteractionController<ChannelSink>,
        tokio::sync::mpsc::UnboundedReceiver<DashboardUpdate>,
    ) {
        let (sink, rx) = ChannelSink::new();
        (
            InteractionController::new(datasets(), DashboardConfig::default(), sink),
            rx,
        )
    }

    #[test]
    fn publishes_combined_update() {
        let (mut controller, mut rx) = controller();

        let pending = controller.begin_interaction(DONETSK);
        let update = controller.complete(pending.resolve()).unwrap();

        let battles = &update.statistics[&EventCategory::Battles];
        assert_eq!(battles.event_count, 2);
        assert_eq!(battles.total_fatalities, 8);
        assert_eq!(battles.average_fatalities, "4.00");
        assert_eq!(battles.max_fatalities, 6);
        assert_eq!(battles.date_range.start, "1/1/2023");
        assert_eq!(battles.date_range.end, "1/3/2023");
        assert_eq!(update.statistics[&EventCategory::Explosions].event_count, 1);

        let dates: Vec<&str> = update.series.iter().map(|p| p.date.as_str()).collect();
        assert_eq!(dates, vec!["2023-01-01", "2023-01-03"]);
        assert_eq!(update.series[1].count(EventCategory::Battles), 1);
        assert_eq!(update.series[1].count(EventCategory::Explosions), 1);

        assert_eq!(rx.try_recv().unwrap(), update);
        assert!(rx.try_recv().is_err());
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn miss_publishes_empty_statistics() {
        let (mut controller, _rx) = controller();

        let pending = controller.begin_interaction(OPEN_SEA);
        let update = controller.complete(pending.resolve()).unwrap();

        for category in EventCategory::all() {
            let stats = &update.statistics[category];
            assert_eq!(stats.event_count, 0);
            assert_eq!(stats.average_fatalities, "0");
            assert_eq!(stats.date_range.start, NOT_AVAILABLE);
        }
        assert!(update.series.is_empty());
    }

    #[test]
    fn stale_result_is_dropped() {
        let (mut controller, mut rx) = controller();

        let first = controller.begin_interaction(DONETSK);
        let second = controller.begin_interaction(KHARKIV);

        let second_update = controller.complete(second.resolve()).unwrap();
        assert!(controller.complete(first.resolve()).is_none());

        assert_eq!(second_update.sequence, 2);
        assert_eq!(rx.try_recv().unwrap().sequence, 2);
        assert!(rx.try_recv().is_err());
        assert_eq!(
            controller.last_update().map(|u| u.sequence),
            Some(2)
        );
    }

    #[test]
    fn older_result_arriving_first_is_dropped() {
        let (mut controller, mut rx) = controller();

        let first = controller.begin_interaction(DONETSK);
        let second = controller.begin_interaction(KHARKIV);

        assert!(controller.complete(first.resolve()).is_none());
        assert_eq!(
            controller.state(),
            ControllerState::Recomputing { sequence: 2 }
        );

        controller.complete(second.resolve()).unwrap();
        assert_eq!(rx.try_recv().unwrap().sequence, 2);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn selection_replaces_not_accumulates() {
        let (mut controller, _rx) = controller();

        let first = controller.begin_interaction(DONETSK);
        controller.complete(first.resolve()).unwrap();
        let second = controller.begin_interaction(KHARKIV);
        let update = controller.complete(second.resolve()).unwrap();

        let battles = &update.statistics[&EventCategory::Battles];
        assert_eq!(battles.event_count, 1);
        assert_eq!(battles.total_fatalities, 1);
        assert_eq!(update.statistics[&EventCategory::Explosions].event_count, 0);
    }

    #[test]
    fn identical_interactions_are_idempotent() {
        let (mut controller, _rx) = controller();

        let first = controller.begin_interaction(DONETSK);
        let a = controller.complete(first.resolve()).unwrap();
        let second = controller.begin_interaction(DONETSK);
        let b = controller.complete(second.resolve()).unwrap();

        assert_eq!(a.statistics, b.statistics);
        assert_eq!(a.series, b.series);
        assert_ne!(a.sequence, b.sequence);
    }

    #[test]
    fn config_change_discards_in_flight_result() {
        let (mut controller, mut rx) = controller();

        let pending = controller.begin_interaction(DONETSK);
        controller.update_config(|config| config.hex.radius_m = 5_000.0);

        assert!(controller.complete(pending.resolve()).is_none());
        assert!(rx.try_recv().is_err());
        assert_eq!(controller.config_version(), 1);
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn hidden_category_reports_empty_statistics() {
        let (mut controller, _rx) = controller();
        controller.update_config(|config| config.layers.explosions = false);

        let pending = controller.begin_interaction(DONETSK);
        let update = controller.complete(pending.resolve()).unwrap();

        assert_eq!(update.statistics.len(), 2);
        assert!(update.statistics[&EventCategory::Explosions].is_empty());
        assert_eq!(update.statistics[&EventCategory::Battles].event_count, 2);
        assert!(
            update
                .series
                .iter()
                .all(|p| p.count(EventCategory::Explosions) == 0)
        );
        assert_eq!(update.config_version, 1);
    }

    #[test]
    fn brushing_selects_neighbouring_bins() {
        let (mut controller, _rx) = controller();
        controller.update_config(|config| {
            config.brushing.enabled = true;
            config.brushing.radius_m = 300_000.0;
        });

        let pending = controller.begin_interaction(DONETSK);
        let update = controller.complete(pending.resolve()).unwrap();

        assert_eq!(update.statistics[&EventCategory::Battles].event_count, 3);
    }

    #[test]
    fn custom_date_format() {
        let (mut controller, _rx) = controller();
        controller.update_config(|config| config.display.date_format = "%Y-%m-%d".to_string());

        let pending = controller.begin_interaction(DONETSK);
        let update = controller.complete(pending.resolve()).unwrap();

        assert_eq!(
            update.statistics[&EventCategory::Battles].date_range.end,
            "2023-01-03"
        );
    }

    #[test]
    fn initial_update_is_empty_by_default() {
        let (mut controller, mut rx) = controller();

        let update = controller.initial_update();

        assert_eq!(update.sequence, 0);
        assert_eq!(update.event_count(), 0);
        assert_eq!(update.statistics.len(), 2);
        assert!(update.series.is_empty());
        assert_eq!(rx.try_recv().unwrap(), update);
    }

    #[test]
    fn initial_update_full_dataset() {
        let (sink, _rx) = ChannelSink::new();
        let config = DashboardConfig {
            initial_scope: InitialScope::FullDataset,
            ..DashboardConfig::default()
        };
        let mut controller = InteractionController::new(datasets(), config, sink);

        let update = controller.initial_update();

        assert_eq!(update.statistics[&EventCategory::Battles].event_count, 3);
        assert_eq!(update.statistics[&EventCategory::Explosions].event_count, 1);
        assert_eq!(update.series.len(), 3);
    }

    #[test]
    fn missing_category_is_empty() {
        let (sink, _rx) = ChannelSink::new();
        let mut controller = InteractionController::new(
            vec![(
                EventCategory::Battles,
                vec![EventRecord::new("b1", 37.8, 48.0, day(1), 1)],
            )],
            DashboardConfig::default(),
            sink,
        );

        assert!(controller.records(EventCategory::Explosions).is_empty());
        let pending = controller.begin_interaction(DONETSK);
        let update = controller.complete(pending.resolve()).unwrap();
        assert!(update.statistics[&EventCategory::Explosions].is_empty());
        assert_eq!(update.series[0].count(EventCategory::Explosions), 0);
    }

    #[test]
    fn tooltip_does_not_change_state() {
        let (controller, mut rx) = controller();

        let tips = controller.tooltip(37.80, 48.00);

        assert!(tips[&EventCategory::Battles].ends_with("Event Count: 2"));
        assert!(tips[&EventCategory::Explosions].ends_with("Event Count: 1"));
        assert_eq!(controller.state(), ControllerState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn interact_resolves_on_blocking_worker() {
        let (mut controller, mut rx) = controller();

        let update = controller.interact(DONETSK).await.unwrap().unwrap();

        assert_eq!(update.sequence, 1);
        assert_eq!(update.statistics[&EventCategory::Battles].event_count, 2);
        assert_eq!(rx.recv().await.unwrap(), update);
    }

    #[tokio::test]
    async fn pending_interaction_is_send() {
        let (mut controller, _rx) = controller();

        let pending = controller.begin_interaction(KHARKIV);
        let resolved = tokio::spawn(async move { pending.resolve() }).await.unwrap();

        let update = controller.complete(resolved).unwrap();
        assert_eq!(update.statistics[&EventCategory::Battles].event_count, 1);
    }
}
