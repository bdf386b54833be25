#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interaction controller for the conflict dashboard.
//!
//! The [`InteractionController`] turns pointer interactions into
//! [`DashboardUpdate`]s: it resolves the selection on the current hex
//! layers, computes per-category statistics and the combined date series,
//! and publishes the result to a [`PresentationSink`] only if nothing newer
//! superseded it in the meantime.
//!
//! [`DashboardUpdate`]: conflict_map_dashboard_models::DashboardUpdate

pub mod config;
pub mod controller;
pub mod layers;
pub mod sink;

pub use config::{load_config, parse_config};
pub use controller::{
    ControllerState, InteractionController, PendingInteraction, ResolvedInteraction, Ticket,
};
pub use layers::LayerSet;
pub use sink::{ChannelSink, LogSink, NullSink, PresentationSink};

/// Errors that can occur in dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// Config file is not valid TOML for [`DashboardConfig`].
    ///
    /// [`DashboardConfig`]: conflict_map_dashboard_models::DashboardConfig
    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking task resolving an interaction panicked or was
    /// cancelled.
    #[error("Resolution task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
