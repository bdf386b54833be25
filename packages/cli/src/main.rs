#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the conflict event dashboard.
//!
//! ```text
//! conflict_map summary
//! conflict_map select --lng 37.8 --lat 48.0 [--brush-radius 20000]
//! conflict_map series
//! conflict_map hexbins --category battles
//! conflict_map tooltip --lng 37.8 --lat 48.0
//! conflict_map sources
//! ```
//!
//! Datasets are read from `--data-dir` using the registered file names,
//! unless `--battles` or `--explosions` point elsewhere. Files ending in
//! `.json` are read as ACLED API payloads. Output is JSON on stdout; logs
//! and progress go to stderr.

mod data;

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use conflict_map_analytics::{aggregate_categories_by_date, compute_statistics_with_format, prepare_chart};
use conflict_map_dashboard::{InteractionController, LogSink, load_config};
use conflict_map_dashboard_models::{DashboardConfig, Interaction};
use conflict_map_event_models::EventCategory;

use crate::data::{DataPaths, load_datasets};

#[derive(Parser)]
#[command(
    name = "conflict_map",
    about = "Explore battles and explosions event data"
)]
struct Cli {
    /// Directory holding the dataset exports
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,
    /// Battles dataset (CSV or JSON), overrides the registered file
    #[arg(long, global = true)]
    battles: Option<PathBuf>,
    /// Explosions dataset (CSV or JSON), overrides the registered file
    #[arg(long, global = true)]
    explosions: Option<PathBuf>,
    /// Dashboard config (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Statistics over every loaded event
    Summary,
    /// Run one map interaction and print the resulting update
    Select {
        /// Longitude of the interaction
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Latitude of the interaction
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Select every bin within this many metres (enables brushing)
        #[arg(long)]
        brush_radius: Option<f64>,
    },
    /// Per-day counts over every loaded event, prepared for a stacked chart
    Series,
    /// Visible hex bins of one category as `GeoJSON`
    Hexbins {
        /// Category to export
        #[arg(long)]
        category: EventCategory,
    },
    /// Hover text at a point
    Tooltip {
        /// Longitude of the pointer
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Latitude of the pointer
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
    },
    /// List the registered data sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = conflict_map_cli_utils::init_logger();
    let cli = Cli::parse();

    if matches!(cli.command, Commands::Sources) {
        let sources = conflict_map_source::registry::all_sources()?;
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DashboardConfig::default(),
    };

    let mut overrides = BTreeMap::new();
    if let Some(path) = cli.battles {
        overrides.insert(EventCategory::Battles, path);
    }
    if let Some(path) = cli.explosions {
        overrides.insert(EventCategory::Explosions, path);
    }
    let paths = DataPaths {
        data_dir: cli.data_dir,
        overrides,
    };
    let datasets = tokio::task::spawn_blocking(move || load_datasets(&paths, &multi)).await??;
    log::info!(
        "Loaded {} events",
        datasets.values().map(Vec::len).sum::<usize>()
    );

    match cli.command {
        Commands::Summary => {
            let statistics: BTreeMap<EventCategory, _> = datasets
                .iter()
                .map(|(category, records)| {
                    (
                        *category,
                        compute_statistics_with_format(records, &config.display.date_format),
                    )
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&statistics)?);
        }
        Commands::Select {
            lng,
            lat,
            brush_radius,
        } => {
            if let Some(radius_m) = brush_radius {
                config.brushing.enabled = true;
                config.brushing.radius_m = radius_m;
            }
            let mut controller = InteractionController::new(datasets, config, LogSink);
            if let Some(update) = controller.interact(Interaction::new(lng, lat)).await? {
                println!("{}", serde_json::to_string_pretty(&update)?);
            }
        }
        Commands::Series => {
            let series = aggregate_categories_by_date(
                datasets
                    .iter()
                    .map(|(category, records)| (*category, records.iter())),
            );
            let chart = prepare_chart(series, EventCategory::all());
            println!("{}", serde_json::to_string_pretty(&chart)?);
        }
        Commands::Hexbins { category } => {
            let controller = InteractionController::new(datasets, config, LogSink);
            if let Some(layer) = controller.layers().layer(category) {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&layer.to_feature_collection())?
                );
            }
        }
        Commands::Tooltip { lng, lat } => {
            let controller = InteractionController::new(datasets, config, LogSink);
            for (category, text) in controller.tooltip(lng, lat) {
                println!("{}\n{text}\n", category.title());
            }
        }
        // Answered before any data is loaded.
        Commands::Sources => {}
    }

    Ok(())
}
