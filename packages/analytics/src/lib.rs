#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analytical query engine for the used-car market dashboard.
//!
//! A query narrows one snapshot with [`filter::apply_filters`], then feeds
//! the same filtered view to the zone aggregator ([`zones`]) and the
//! statistics engine ([`stats`]). [`query::QueryEngine`] ties the steps
//! together. Every function here is pure: the snapshots and zone geometry
//! are borrowed read-only and each call allocates its own result.

pub mod config;
pub mod filter;
pub mod query;
pub mod stats;
pub mod zones;

#[cfg(test)]
mod fixtures;

use thiserror::Error;

pub use config::{AnalyticsConfig, SimplificationConfig};
pub use filter::{FilteredView, apply_filters};
pub use query::QueryEngine;

/// Errors that can occur while configuring the engine.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Reading the configuration file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`AnalyticsConfig`].
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}
