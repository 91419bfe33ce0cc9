//! Single entry point the dashboard calls on every filter change.

use car_market::SnapshotStore;
use car_market_analytics_models::{MapCenter, QueryResult};
use car_market_models::FilterCriteria;
use car_market_spatial::ZoneGeometry;

use crate::{AnalyticsConfig, filter::apply_filters, stats, zones};

/// Runs every analysis for a set of criteria.
///
/// Holds only shared references, so one engine can serve many threads.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    store: &'a SnapshotStore,
    geometry: &'a ZoneGeometry,
    config: &'a AnalyticsConfig,
}

impl<'a> QueryEngine<'a> {
    /// Builds an engine over data loaded once at startup.
    #[must_use]
    pub const fn new(
        store: &'a SnapshotStore,
        geometry: &'a ZoneGeometry,
        config: &'a AnalyticsConfig,
    ) -> Self {
        Self {
            store,
            geometry,
            config,
        }
    }

    /// Map center over every zone, independent of any filter.
    #[must_use]
    pub fn map_center(&self) -> Option<MapCenter> {
        self.geometry.map_center().map(|point| MapCenter {
            lon: point.x(),
            lat: point.y(),
        })
    }

    /// Filters once, then derives the listing, choropleth and charts from
    /// the same selection.
    #[must_use]
    pub fn query(&self, criteria: &FilterCriteria) -> QueryResult<'a> {
        let view = apply_filters(self.store, criteria);

        let zone_stats = zones::aggregate_by_zone(
            &view,
            self.geometry,
            self.store.regions(),
            &self.config.simplification,
        );
        let scatter_series = stats::scatter_series(&view, self.config);
        let brand_distribution = stats::brand_distribution(&view, self.store.brands(), self.config);
        let correlation_matrix = stats::correlation_matrix(&view);

        let records = view.sorted_by_id();
        let description = format!("{} ads", records.len());

        log::debug!(
            "Query {:?}: {} records, {} zones, {} scatter points",
            criteria,
            records.len(),
            zone_stats.len(),
            scatter_series.len()
        );

        QueryResult {
            criteria: *criteria,
            records,
            description,
            zone_stats,
            map_center: self.map_center(),
            scatter_series,
            brand_distribution,
            correlation_matrix,
        }
    }
}
