#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the used-car market query engine.
//!
//! Loads the snapshots and zone boundaries once, runs a single query and
//! prints the result as JSON. Also lists the dropdown options and resolves
//! a map coordinate to its postal code.

use std::path::{Path, PathBuf};

use car_market::{DataPaths, LookupTable, SnapshotStore, loader};
use car_market_analytics::{AnalyticsConfig, QueryEngine};
use car_market_models::FilterCriteria;
use car_market_spatial::ZoneGeometry;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

/// Query the used-car advertisement snapshots.
#[derive(Parser)]
#[command(name = "car_market_cli")]
#[command(about = "Query the used-car advertisement snapshots")]
struct Cli {
    /// Directory holding the snapshot CSVs and `postal_codes.geojson`.
    #[arg(long, env = "CAR_MARKET_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Run one query and print the result.
    Query {
        /// Snapshot year; anything other than "2020" selects 2023.
        #[arg(long, default_value = "2020")]
        year: String,

        /// Region id (`-1` or `0` for all).
        #[arg(long, allow_hyphen_values = true)]
        region: Option<i32>,

        /// Seller filter: "all", "true" (dealers) or "false" (private).
        #[arg(long, default_value = "all")]
        seller: String,

        /// Four-digit postal code (`0` for all).
        #[arg(long)]
        postal_code: Option<u32>,

        /// Brand id (`-1` or `0` for all).
        #[arg(long, allow_hyphen_values = true)]
        brand: Option<i32>,

        /// Model id (`-1` or `0` for all).
        #[arg(long, allow_hyphen_values = true)]
        model: Option<i32>,

        /// TOML file overriding the analytics defaults.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print counts, brands and correlations without records or
        /// geometry.
        #[arg(long)]
        summary: bool,
    },

    /// List the dropdown options.
    Options {
        /// Only list one kind of option.
        #[arg(long, value_enum)]
        kind: Option<OptionKind>,
    },

    /// Print the postal code whose boundary contains a coordinate.
    Zone {
        /// Longitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Latitude in degrees.
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },
}

/// Lookup tables backing the dropdowns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OptionKind {
    Region,
    Brand,
    Model,
}

#[derive(Serialize)]
struct DropdownOption<'a> {
    id: i32,
    name: &'a str,
}

#[derive(Serialize)]
struct ZoneHit {
    lon: f64,
    lat: f64,
    postal_code: Option<u32>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let args = Cli::parse();
    let paths = DataPaths::in_dir(&args.data_dir);

    match args.command {
        Commands::Query {
            year,
            region,
            seller,
            postal_code,
            brand,
            model,
            config,
            summary,
        } => {
            let criteria =
                FilterCriteria::from_dropdowns(&year, region, &seller, postal_code, brand, model)?;
            let config = load_config(config.as_deref())?;
            let store = SnapshotStore::load(&paths)?;
            let geometry = ZoneGeometry::load(&paths.postal_codes)?;

            let engine = QueryEngine::new(&store, &geometry, &config);
            let result = engine.query(&criteria);
            log::info!("{}", result.description);

            let json = if summary {
                serde_json::to_string_pretty(&result.summary())?
            } else {
                serde_json::to_string_pretty(&result)?
            };
            println!("{json}");
        }
        Commands::Options { kind } => {
            let kinds = kind.map_or_else(
                || vec![OptionKind::Region, OptionKind::Brand, OptionKind::Model],
                |kind| vec![kind],
            );

            let mut listing = serde_json::Map::new();
            for kind in kinds {
                let (key, path) = match kind {
                    OptionKind::Region => ("regions", &paths.regions),
                    OptionKind::Brand => ("brands", &paths.brands),
                    OptionKind::Model => ("models", &paths.models),
                };
                let table = loader::read_lookup(path)?;
                listing.insert(key.to_string(), serde_json::to_value(dropdown(&table))?);
            }
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Commands::Zone { lon, lat } => {
            let geometry = ZoneGeometry::load(&paths.postal_codes)?;
            let hit = ZoneHit {
                lon,
                lat,
                postal_code: geometry.lookup_zone(lon, lat),
            };
            println!("{}", serde_json::to_string_pretty(&hit)?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalyticsConfig, car_market_analytics::AnalyticsError> {
    path.map_or_else(|| Ok(AnalyticsConfig::default()), AnalyticsConfig::load)
}

fn dropdown(table: &LookupTable) -> Vec<DropdownOption<'_>> {
    table
        .options()
        .iter()
        .map(|(id, name)| DropdownOption { id: *id, name })
        .collect()
}
