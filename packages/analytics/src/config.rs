//! Tunable thresholds for the query engine.
//!
//! Defaults match the dashboard's historical behavior. Any field can be
//! overridden from a TOML file; missing fields keep their defaults.
//!
//! ```toml
//! top_brands = 10
//! scatter_epoch = "1900-01-01"
//!
//! [simplification]
//! row_threshold = 160000
//! fine_tolerance = 25.0
//! coarse_tolerance = 50.0
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::AnalyticsError;

/// Joined rows up to which zone boundaries get the fine tolerance.
pub const DEFAULT_ROW_THRESHOLD: usize = 160_000;

/// Tolerance in metres for small joins.
pub const DEFAULT_FINE_TOLERANCE: f64 = 25.0;

/// Tolerance in metres for large joins.
pub const DEFAULT_COARSE_TOLERANCE: f64 = 50.0;

/// Number of brands kept in the distribution.
pub const DEFAULT_TOP_BRANDS: usize = 10;

/// How zone boundaries are simplified as the join grows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplificationConfig {
    /// Largest joined row count that still uses `fine_tolerance`.
    pub row_threshold: usize,
    /// Tolerance in metres at or below the threshold.
    pub fine_tolerance: f64,
    /// Tolerance in metres above the threshold.
    pub coarse_tolerance: f64,
}

impl Default for SimplificationConfig {
    fn default() -> Self {
        Self {
            row_threshold: DEFAULT_ROW_THRESHOLD,
            fine_tolerance: DEFAULT_FINE_TOLERANCE,
            coarse_tolerance: DEFAULT_COARSE_TOLERANCE,
        }
    }
}

impl SimplificationConfig {
    /// Tolerance for a join of `joined_rows` advertisements.
    #[must_use]
    pub const fn tolerance_for(&self, joined_rows: usize) -> f64 {
        if joined_rows <= self.row_threshold {
            self.fine_tolerance
        } else {
            self.coarse_tolerance
        }
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Zone boundary simplification.
    pub simplification: SimplificationConfig,
    /// Brands kept in the distribution.
    pub top_brands: usize,
    /// Production dates at or before this are treated as unknown.
    pub scatter_epoch: NaiveDate,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            simplification: SimplificationConfig::default(),
            top_brands: DEFAULT_TOP_BRANDS,
            scatter_epoch: default_scatter_epoch(),
        }
    }
}

impl AnalyticsConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Config`] if the document is malformed.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, AnalyticsError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Reads a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, AnalyticsError> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalyticsError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::info!("Loaded analytics config from {}", path.display());
        Ok(config)
    }
}

fn default_scatter_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}
