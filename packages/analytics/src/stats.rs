//! Scatter series, brand distribution and correlation matrix.

use std::{borrow::Cow, collections::BTreeMap};

use car_market::LookupTable;
use car_market_analytics_models::{BrandShare, CorrelationMatrix, FeatureColumn, ScatterPoint};
use car_market_models::AdRecord;
use chrono::Datelike as _;

use crate::{AnalyticsConfig, filter::FilteredView};

/// Production date vs. price points in view order.
///
/// Records without a production date, or dated at or before
/// `config.scatter_epoch`, are left out.
#[must_use]
pub fn scatter_series(view: &FilteredView<'_>, config: &AnalyticsConfig) -> Vec<ScatterPoint> {
    view.iter()
        .filter_map(|record| {
            let production = record
                .production
                .filter(|&date| date > config.scatter_epoch)?;
            Some(ScatterPoint {
                production,
                price: record.price,
                postal_code: record.postal_code,
            })
        })
        .collect()
}

/// The `config.top_brands` most advertised brands, most frequent first.
///
/// Equal counts are ordered by brand name.
#[must_use]
pub fn brand_distribution(
    view: &FilteredView<'_>,
    brands: &LookupTable,
    config: &AnalyticsConfig,
) -> Vec<BrandShare> {
    let mut counts: BTreeMap<Cow<'_, str>, u64> = BTreeMap::new();
    for record in view.iter() {
        *counts
            .entry(brands.name_or_unknown(record.brand_id))
            .or_default() += 1;
    }

    let mut shares: Vec<BrandShare> = counts
        .into_iter()
        .map(|(brand, count)| BrandShare {
            brand: brand.into_owned(),
            count,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count));
    shares.truncate(config.top_brands);
    shares
}

/// Pearson coefficients between every pair of [`FeatureColumn`]s.
///
/// Each pair uses only the records where both values are present.
/// Coefficients are rounded to two decimals.
#[must_use]
pub fn correlation_matrix(view: &FilteredView<'_>) -> CorrelationMatrix {
    let columns = FeatureColumn::all();
    let samples: Vec<Vec<Option<f64>>> = columns
        .iter()
        .map(|&column| view.iter().map(|record| feature_value(column, record)).collect())
        .collect();

    let matrix = CorrelationMatrix::symmetric(columns.to_vec(), |i, j| {
        let pairs = samples[i]
            .iter()
            .zip(&samples[j])
            .filter_map(|(&x, &y)| Some((x?, y?)));
        round_coefficient(pearson(pairs))
    });

    log::debug!(
        "Computed {}x{} correlation matrix over {} records",
        columns.len(),
        columns.len(),
        view.len()
    );

    matrix
}

/// Pearson correlation of `pairs`.
///
/// NaN when there are fewer than two pairs or either side has zero
/// variance.
#[must_use]
pub fn pearson(pairs: impl IntoIterator<Item = (f64, f64)>) -> f64 {
    let pairs: Vec<(f64, f64)> = pairs.into_iter().collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }

    #[allow(clippy::cast_precision_loss)]
    let n = pairs.len() as f64;
    let (sum_x, sum_y) = pairs
        .iter()
        .fold((0.0, 0.0), |(sx, sy), &(x, y)| (sx + x, sy + y));
    let (mean_x, mean_y) = (sum_x / n, sum_y / n);

    let (sxx, syy, sxy) = pairs.iter().fold((0.0, 0.0, 0.0), |(xx, yy, xy), &(x, y)| {
        let dx = x - mean_x;
        let dy = y - mean_y;
        (dx.mul_add(dx, xx), dy.mul_add(dy, yy), dx.mul_add(dy, xy))
    });

    if sxx <= 0.0 || syy <= 0.0 {
        return f64::NAN;
    }

    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

fn round_coefficient(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[allow(clippy::cast_precision_loss)]
fn feature_value(column: FeatureColumn, record: &AdRecord) -> Option<f64> {
    let value = match column {
        FeatureColumn::RegionId => f64::from(record.region_id),
        FeatureColumn::Price => record.price as f64,
        FeatureColumn::Mileage => record.mileage as f64,
        FeatureColumn::Production => f64::from(record.production?.num_days_from_ce()),
        FeatureColumn::DocumentValid => f64::from(record.document_valid?.num_days_from_ce()),
        FeatureColumn::Adoldness => f64::from(record.adoldness),
        FeatureColumn::Ccm => f64::from(record.ccm),
        FeatureColumn::BrandId => f64::from(record.brand_id),
        FeatureColumn::ModelId => f64::from(record.model_id),
        FeatureColumn::Pictures => f64::from(record.pictures),
        FeatureColumn::ProfessionalSeller => f64::from(u8::from(record.professional_seller)),
        FeatureColumn::ClimateId => f64::from(record.climate_id),
        FeatureColumn::PersonCapacity => f64::from(record.person_capacity),
        FeatureColumn::Doors => f64::from(record.doors),
        FeatureColumn::Color => f64::from(record.color),
        FeatureColumn::Highlighted => f64::from(u8::from(record.highlighted)),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{apply_filters, fixtures};
    use car_market_models::{FilterCriteria, SnapshotYear};
    use chrono::{Days, NaiveDate};

    fn produced(ad_id: i64, price: i64, production: Option<NaiveDate>) -> AdRecord {
        AdRecord {
            production,
            ..fixtures::ad(ad_id, 1, 1011, 10, price)
        }
    }

    fn view_of(store: &car_market::SnapshotStore, year: SnapshotYear) -> FilteredView<'_> {
        apply_filters(store, &FilterCriteria::for_year(year))
    }

    #[test]
    fn scatter_keeps_view_order_and_drops_epoch() {
        let store = fixtures::store();
        let view = view_of(&store, SnapshotYear::Y2020);
        let series = scatter_series(&view, &AnalyticsConfig::default());

        let prices: Vec<i64> = series.iter().map(|point| point.price).collect();
        assert_eq!(prices, vec![1_000_000, 3_000_000, 4_000_000]);
        assert_eq!(series[2].production, fixtures::date(1900, 1, 2));
        assert_eq!(series[2].postal_code, 6720);
    }

    #[test]
    fn scatter_epoch_is_exclusive() {
        let store = fixtures::store_from(
            vec![
                produced(1, 1_000, Some(fixtures::date(1900, 1, 1))),
                produced(2, 2_000, Some(fixtures::date(1900, 1, 2))),
            ],
            Vec::new(),
        );
        let view = view_of(&store, SnapshotYear::Y2020);
        let series = scatter_series(&view, &AnalyticsConfig::default());
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].production, fixtures::date(1900, 1, 2));
    }

    #[test]
    fn scatter_respects_configured_epoch() {
        let store = fixtures::store();
        let view = view_of(&store, SnapshotYear::Y2023);
        let config = AnalyticsConfig {
            scatter_epoch: fixtures::date(2015, 1, 1),
            ..AnalyticsConfig::default()
        };
        let series = scatter_series(&view, &config);
        let codes: Vec<u32> = series.iter().map(|point| point.postal_code).collect();
        assert_eq!(codes, vec![1011, 6720]);
    }

    #[test]
    fn brands_sorted_by_count_then_name() {
        let store = fixtures::store();
        let view = view_of(&store, SnapshotYear::Y2020);
        let shares = brand_distribution(&view, store.brands(), &AnalyticsConfig::default());

        let expected = vec![
            BrandShare {
                brand: "Opel".to_string(),
                count: 3,
            },
            BrandShare {
                brand: "Audi".to_string(),
                count: 1,
            },
            BrandShare {
                brand: "Suzuki".to_string(),
                count: 1,
            },
        ];
        assert_eq!(shares, expected);
    }

    #[test]
    fn brands_truncated_and_non_increasing() {
        let ads = (0..30)
            .map(|i| fixtures::ad(i, 1, 1011, i32::try_from(i % 15).unwrap(), 1_000))
            .collect();
        let store = fixtures::store_from(ads, Vec::new());
        let view = view_of(&store, SnapshotYear::Y2020);
        let shares = brand_distribution(&view, store.brands(), &AnalyticsConfig::default());

        assert_eq!(shares.len(), 10);
        assert!(shares.windows(2).all(|pair| pair[0].count >= pair[1].count));
        assert!(shares.iter().any(|share| share.brand == "Unknown (0)"));
    }

    #[test]
    fn empty_view_has_empty_series_and_undefined_matrix() {
        let store = fixtures::store();
        let view = apply_filters(
            &store,
            &FilterCriteria::for_year(SnapshotYear::Y2020).with_brand(9_999),
        );
        let config = AnalyticsConfig::default();

        assert!(scatter_series(&view, &config).is_empty());
        assert!(brand_distribution(&view, store.brands(), &config).is_empty());

        let matrix = correlation_matrix(&view);
        assert_eq!(matrix.size(), 16);
        assert!(matrix.values().iter().flatten().all(|value| value.is_nan()));
    }

    #[test]
    fn matrix_is_symmetric_with_unit_diagonal() {
        let store = fixtures::store();
        let view = view_of(&store, SnapshotYear::Y2020);
        let matrix = correlation_matrix(&view);

        let values = matrix.values();
        for (i, row) in values.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                let mirrored = values[j][i];
                assert!(
                    value.to_bits() == mirrored.to_bits(),
                    "({i}, {j}) = {value}, ({j}, {i}) = {mirrored}"
                );
            }
        }

        for column in [
            FeatureColumn::Price,
            FeatureColumn::Mileage,
            FeatureColumn::Production,
            FeatureColumn::ProfessionalSeller,
        ] {
            let diagonal = matrix.get(column, column).unwrap();
            assert!((diagonal - 1.0).abs() < f64::EPSILON, "{column}: {diagonal}");
        }
    }

    #[test]
    fn constant_columns_are_undefined() {
        let store = fixtures::store();
        let view = view_of(&store, SnapshotYear::Y2020);
        let matrix = correlation_matrix(&view);

        assert!(
            matrix
                .get(FeatureColumn::Pictures, FeatureColumn::Pictures)
                .unwrap()
                .is_nan()
        );
        assert!(
            matrix
                .get(FeatureColumn::Pictures, FeatureColumn::Price)
                .unwrap()
                .is_nan()
        );
        assert!(
            matrix
                .get(FeatureColumn::DocumentValid, FeatureColumn::Price)
                .unwrap()
                .is_nan(),
            "no document dates present"
        );
    }

    #[test]
    fn missing_dates_are_skipped_pairwise() {
        let base = fixtures::date(2010, 1, 1);
        let ads = vec![
            produced(1, 100, Some(base)),
            produced(2, 200, base.checked_add_days(Days::new(10))),
            produced(3, 300, base.checked_add_days(Days::new(20))),
            produced(4, 5, None),
        ];
        let store = fixtures::store_from(ads, Vec::new());
        let view = view_of(&store, SnapshotYear::Y2020);
        let matrix = correlation_matrix(&view);

        let coefficient = matrix
            .get(FeatureColumn::Production, FeatureColumn::Price)
            .unwrap();
        assert!((coefficient - 1.0).abs() < f64::EPSILON, "{coefficient}");
    }

    #[test]
    fn pearson_rounds_to_two_decimals() {
        let r = round_coefficient(pearson([(1.0, 1.0), (2.0, 2.0), (3.0, 5.0)]));
        assert!((r - 0.96).abs() < f64::EPSILON, "{r}");

        let r = round_coefficient(pearson([(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]));
        assert!((r + 1.0).abs() < f64::EPSILON, "{r}");
    }

    #[test]
    fn pearson_needs_two_varying_pairs() {
        assert!(pearson(Vec::<(f64, f64)>::new()).is_nan());
        assert!(pearson([(1.0, 2.0)]).is_nan());
        assert!(pearson([(1.0, 2.0), (1.0, 3.0)]).is_nan());
    }
}
