#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Immutable store for the two used-car market snapshots.
//!
//! The 2020 and 2023 advertisement snapshots and the region, brand and
//! model lookup tables are read once at startup into a [`SnapshotStore`].
//! Nothing in the store can be mutated afterwards, so a single instance can
//! be shared by every query without locking.

pub mod loader;
pub mod lookup;
pub mod snapshot;

use std::path::{Path, PathBuf};

use car_market_models::{AdRecord, SnapshotYear};
use thiserror::Error;

pub use lookup::LookupTable;
pub use snapshot::Snapshot;

/// Errors that can occur while loading snapshots and lookup tables.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Reading a data file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A date cell could not be parsed.
    #[error("Invalid date in column {column}: '{value}'")]
    InvalidDate {
        /// Column the value came from.
        column: &'static str,
        /// The rejected cell.
        value: String,
    },

    /// A boolean cell could not be parsed.
    #[error("Invalid boolean in column {column}: '{value}'")]
    InvalidBool {
        /// Column the value came from.
        column: &'static str,
        /// The rejected cell.
        value: String,
    },

    /// A lookup table row was missing its id or name.
    #[error("Malformed lookup row in {path}: {message}")]
    Lookup {
        /// Path to the lookup CSV.
        path: String,
        /// Description of what went wrong.
        message: String,
    },
}

/// Locations of every input file, relative to a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    /// 2020 advertisements CSV.
    pub ads_2020: PathBuf,
    /// 2023 advertisements CSV.
    pub ads_2023: PathBuf,
    /// Region id/name CSV.
    pub regions: PathBuf,
    /// Brand id/name CSV.
    pub brands: PathBuf,
    /// Model id/name CSV.
    pub models: PathBuf,
    /// Postal code boundaries `GeoJSON`.
    pub postal_codes: PathBuf,
}

impl DataPaths {
    /// Standard layout of the scraped dataset under `data_dir`.
    #[must_use]
    pub fn in_dir(data_dir: &Path) -> Self {
        Self {
            ads_2020: data_dir.join("db_2020/advertisements_202006112147.csv"),
            ads_2023: data_dir.join("db_2023/advertisements_processed.csv"),
            regions: data_dir.join("db_2020/region_202006112147.csv"),
            brands: data_dir.join("db_2020/brand_202006112147.csv"),
            models: data_dir.join("db_2020/model_202006112147.csv"),
            postal_codes: data_dir.join("postal_codes.geojson"),
        }
    }
}

/// Both snapshots and the three lookup tables.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot_2020: Snapshot,
    snapshot_2023: Snapshot,
    regions: LookupTable,
    brands: LookupTable,
    models: LookupTable,
}

impl SnapshotStore {
    /// Builds a store from already-parsed records and lookups.
    #[must_use]
    pub fn new(
        ads_2020: Vec<AdRecord>,
        ads_2023: Vec<AdRecord>,
        regions: LookupTable,
        brands: LookupTable,
        models: LookupTable,
    ) -> Self {
        Self {
            snapshot_2020: Snapshot::new(SnapshotYear::Y2020, ads_2020),
            snapshot_2023: Snapshot::new(SnapshotYear::Y2023, ads_2023),
            regions,
            brands,
            models,
        }
    }

    /// Loads every CSV input listed in `paths`.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError`] if any file cannot be read or parsed.
    pub fn load(paths: &DataPaths) -> Result<Self, MarketError> {
        let ads_2020 = loader::read_snapshot(&paths.ads_2020, SnapshotYear::Y2020)?;
        log::info!("Loaded {} advertisements from the 2020 snapshot", ads_2020.len());

        let ads_2023 = loader::read_snapshot(&paths.ads_2023, SnapshotYear::Y2023)?;
        log::info!("Loaded {} advertisements from the 2023 snapshot", ads_2023.len());

        let regions = loader::read_lookup(&paths.regions)?;
        let brands = loader::read_lookup(&paths.brands)?;
        let models = loader::read_lookup(&paths.models)?;
        log::info!(
            "Loaded {} regions, {} brands, {} models",
            regions.len(),
            brands.len(),
            models.len()
        );

        Ok(Self::new(ads_2020, ads_2023, regions, brands, models))
    }

    /// The snapshot for `year`.
    #[must_use]
    pub const fn snapshot(&self, year: SnapshotYear) -> &Snapshot {
        match year {
            SnapshotYear::Y2020 => &self.snapshot_2020,
            SnapshotYear::Y2023 => &self.snapshot_2023,
        }
    }

    /// Region names.
    #[must_use]
    pub const fn regions(&self) -> &LookupTable {
        &self.regions
    }

    /// Brand names.
    #[must_use]
    pub const fn brands(&self) -> &LookupTable {
        &self.brands
    }

    /// Model names.
    #[must_use]
    pub const fn models(&self) -> &LookupTable {
        &self.models
    }
}
