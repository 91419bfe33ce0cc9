#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types produced by the used-car market query engine.
//!
//! Everything here is plain data: the presentation layer renders the
//! listing table, the choropleth, the scatter plot, the brand pie and the
//! correlation heat-map straight from these structures.

use std::collections::BTreeMap;

use car_market_models::{AdRecord, FilterCriteria};
use chrono::NaiveDate;
use geo::MultiPolygon;
use serde::{Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};

/// Price statistics and simplified boundary for one postal-code zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStats {
    /// Postal code.
    pub postal_code: u32,
    /// Region of the first advertisement in the zone.
    pub region_id: i32,
    /// Display name of that region.
    pub region_name: String,
    /// Mean asking price.
    pub avg_price: f64,
    /// Lowest asking price.
    pub min_price: i64,
    /// Highest asking price.
    pub max_price: i64,
    /// Number of advertisements in the zone.
    pub ad_count: u64,
    /// Simplified boundary in lon/lat.
    #[serde(serialize_with = "serialize_geometry")]
    pub geometry: MultiPolygon<f64>,
}

/// Per-zone statistics for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneAggregation {
    /// Zones keyed by postal code.
    pub zones: BTreeMap<u32, ZoneStats>,
    /// Advertisements that matched a zone boundary.
    pub joined_rows: usize,
    /// Simplification tolerance in metres, `None` when nothing joined.
    pub tolerance: Option<f64>,
}

impl ZoneAggregation {
    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns `true` if no zone matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Where the map is centred, in lon/lat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapCenter {
    /// Longitude.
    pub lon: f64,
    /// Latitude.
    pub lat: f64,
}

/// One point of the production-date vs. price scatter plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScatterPoint {
    /// Production date.
    pub production: NaiveDate,
    /// Asking price.
    pub price: i64,
    /// Postal code, used for coloring.
    pub postal_code: u32,
}

/// Advertisement count for one brand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandShare {
    /// Brand display name.
    pub brand: String,
    /// Number of advertisements.
    pub count: u64,
}

/// Columns of the correlation heat-map, in display order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FeatureColumn {
    /// Region id.
    RegionId,
    /// Asking price.
    #[strum(serialize = "ad_price")]
    #[serde(rename = "ad_price")]
    Price,
    /// Odometer reading.
    Mileage,
    /// Production date as a day ordinal.
    Production,
    /// Document expiry as a day ordinal.
    #[strum(serialize = "documentvalid")]
    #[serde(rename = "documentvalid")]
    DocumentValid,
    /// Listing age in days.
    Adoldness,
    /// Engine displacement.
    Ccm,
    /// Brand id.
    BrandId,
    /// Model id.
    ModelId,
    /// Picture count.
    #[strum(serialize = "numpictures")]
    #[serde(rename = "numpictures")]
    Pictures,
    /// Dealer flag as 0/1.
    #[strum(serialize = "proseller")]
    #[serde(rename = "proseller")]
    ProfessionalSeller,
    /// Climate-control code.
    #[strum(serialize = "clime_id")]
    #[serde(rename = "clime_id")]
    ClimateId,
    /// Seats.
    PersonCapacity,
    /// Doors.
    #[strum(serialize = "doorsnumber")]
    #[serde(rename = "doorsnumber")]
    Doors,
    /// Color code.
    Color,
    /// Highlight flag as 0/1.
    Highlighted,
}

impl FeatureColumn {
    /// All columns in heat-map order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::RegionId,
            Self::Price,
            Self::Mileage,
            Self::Production,
            Self::DocumentValid,
            Self::Adoldness,
            Self::Ccm,
            Self::BrandId,
            Self::ModelId,
            Self::Pictures,
            Self::ProfessionalSeller,
            Self::ClimateId,
            Self::PersonCapacity,
            Self::Doors,
            Self::Color,
            Self::Highlighted,
        ]
    }
}

/// Square, symmetric matrix of pairwise Pearson coefficients.
///
/// Undefined coefficients (zero variance, too few observations) are NaN
/// and serialize as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    columns: Vec<FeatureColumn>,
    values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Builds the matrix for `columns` from the upper triangle.
    ///
    /// `coefficient(i, j)` is called once for every `i <= j` and mirrored
    /// to `(j, i)`, so the result is always square and symmetric.
    #[must_use]
    pub fn symmetric(
        columns: Vec<FeatureColumn>,
        mut coefficient: impl FnMut(usize, usize) -> f64,
    ) -> Self {
        let size = columns.len();
        let mut values = vec![vec![f64::NAN; size]; size];
        for i in 0..size {
            for j in i..size {
                let value = coefficient(i, j);
                values[i][j] = value;
                values[j][i] = value;
            }
        }
        Self { columns, values }
    }

    /// Column order shared by rows and columns.
    #[must_use]
    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    /// Column names for heat-map axis labels.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.columns.iter().map(|&column| column.into()).collect()
    }

    /// Row-major coefficients.
    #[must_use]
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Coefficient between two columns, or `None` if either column is not
    /// part of the matrix.
    #[must_use]
    pub fn get(&self, row: FeatureColumn, column: FeatureColumn) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == row)?;
        let j = self.columns.iter().position(|c| *c == column)?;
        Some(self.values[i][j])
    }

    /// Number of columns.
    #[must_use]
    pub fn size(&self) -> usize {
        self.columns.len()
    }
}

/// Everything the dashboard renders for one set of criteria.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<'a> {
    /// The criteria that produced this result.
    pub criteria: FilterCriteria,
    /// Matching advertisements ordered by id.
    pub records: Vec<&'a AdRecord>,
    /// Caption for the listing (`"<n> ads"`).
    pub description: String,
    /// Choropleth data.
    pub zone_stats: ZoneAggregation,
    /// Filter-independent map center.
    pub map_center: Option<MapCenter>,
    /// Scatter plot points in snapshot order.
    pub scatter_series: Vec<ScatterPoint>,
    /// Top brands by advertisement count.
    pub brand_distribution: Vec<BrandShare>,
    /// Correlation heat-map.
    pub correlation_matrix: CorrelationMatrix,
}

impl QueryResult<'_> {
    /// Compact overview without the listing or geometry.
    #[must_use]
    pub fn summary(&self) -> QuerySummary {
        QuerySummary {
            criteria: self.criteria,
            record_count: self.records.len(),
            zone_count: self.zone_stats.len(),
            joined_rows: self.zone_stats.joined_rows,
            tolerance: self.zone_stats.tolerance,
            map_center: self.map_center,
            scatter_points: self.scatter_series.len(),
            brand_distribution: self.brand_distribution.clone(),
            correlation_labels: self.correlation_matrix.labels(),
            correlation_matrix: self.correlation_matrix.values().to_vec(),
        }
    }
}

/// Compact overview of a [`QueryResult`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySummary {
    /// The criteria that produced the result.
    pub criteria: FilterCriteria,
    /// Matching advertisements.
    pub record_count: usize,
    /// Zones on the choropleth.
    pub zone_count: usize,
    /// Advertisements that matched a zone boundary.
    pub joined_rows: usize,
    /// Simplification tolerance in metres.
    pub tolerance: Option<f64>,
    /// Map center.
    pub map_center: Option<MapCenter>,
    /// Scatter plot points.
    pub scatter_points: usize,
    /// Top brands.
    pub brand_distribution: Vec<BrandShare>,
    /// Heat-map axis labels.
    pub correlation_labels: Vec<&'static str>,
    /// Heat-map values.
    pub correlation_matrix: Vec<Vec<f64>>,
}

fn serialize_geometry<S: Serializer>(
    geometry: &MultiPolygon<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    geojson::Geometry::new(geojson::Value::from(geometry)).serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn feature_columns_use_source_names() {
        let names: Vec<String> = FeatureColumn::all().iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "region_id",
                "ad_price",
                "mileage",
                "production",
                "documentvalid",
                "adoldness",
                "ccm",
                "brand_id",
                "model_id",
                "numpictures",
                "proseller",
                "clime_id",
                "person_capacity",
                "doorsnumber",
                "color",
                "highlighted",
            ]
        );
        assert_eq!("ad_price".parse::<FeatureColumn>().unwrap(), FeatureColumn::Price);
    }

    #[test]
    fn matrix_lookup_by_column() {
        let matrix = CorrelationMatrix::symmetric(
            vec![FeatureColumn::Price, FeatureColumn::Mileage],
            |i, j| if i == j { 1.0 } else { -0.5 },
        );
        assert_eq!(matrix.size(), 2);
        assert_eq!(
            matrix.get(FeatureColumn::Price, FeatureColumn::Mileage),
            Some(-0.5)
        );
        assert_eq!(matrix.get(FeatureColumn::Price, FeatureColumn::Color), None);
        assert_eq!(matrix.labels(), vec!["ad_price", "mileage"]);
    }

    #[test]
    fn symmetric_fills_lower_triangle_from_upper() {
        let mut calls = Vec::new();
        let matrix = CorrelationMatrix::symmetric(
            vec![FeatureColumn::Price, FeatureColumn::Mileage, FeatureColumn::Ccm],
            |i, j| {
                calls.push((i, j));
                f64::from(u32::try_from(i * 10 + j).unwrap())
            },
        );

        assert_eq!(calls, vec![(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)]);
        assert_eq!(matrix.values().len(), 3);
        assert!(matrix.values().iter().all(|row| row.len() == 3));
        assert_eq!(
            matrix.get(FeatureColumn::Ccm, FeatureColumn::Price),
            matrix.get(FeatureColumn::Price, FeatureColumn::Ccm)
        );
        assert_eq!(matrix.get(FeatureColumn::Ccm, FeatureColumn::Mileage), Some(12.0));
    }

    #[test]
    fn empty_column_set_gives_empty_matrix() {
        let matrix = CorrelationMatrix::symmetric(Vec::new(), |_, _| 1.0);
        assert_eq!(matrix.size(), 0);
        assert!(matrix.values().is_empty());
    }

    #[test]
    fn nan_coefficients_serialize_as_null() {
        let matrix = CorrelationMatrix::symmetric(vec![FeatureColumn::Price], |_, _| f64::NAN);
        let json = serde_json::to_value(&matrix).unwrap();
        assert_eq!(json["values"][0][0], serde_json::Value::Null);
        assert_eq!(json["columns"][0], "ad_price");
    }

    #[test]
    fn zone_geometry_serializes_as_geojson() {
        let zone = ZoneStats {
            postal_code: 1011,
            region_id: 1,
            region_name: "Budapest".to_string(),
            avg_price: 2.0,
            min_price: 1,
            max_price: 3,
            ad_count: 2,
            geometry: MultiPolygon(vec![polygon![
                (x: 19.0, y: 47.0),
                (x: 20.0, y: 47.0),
                (x: 20.0, y: 48.0),
                (x: 19.0, y: 47.0),
            ]]),
        };
        let json = serde_json::to_value(&zone).unwrap();
        assert_eq!(json["postalCode"], 1011);
        assert_eq!(json["geometry"]["type"], "MultiPolygon");
        assert_eq!(json["geometry"]["coordinates"][0][0][1][0], 20.0);
    }
}
