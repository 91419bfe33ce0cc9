//! Per-postal-code price aggregation for the choropleth.

use std::collections::BTreeMap;

use car_market::LookupTable;
use car_market_analytics_models::{ZoneAggregation, ZoneStats};
use car_market_models::AdRecord;
use car_market_spatial::{ZoneGeometry, ZoneSimplifier, combined_extent};

use crate::{SimplificationConfig, filter::FilteredView};

/// Running price aggregates for one postal code.
struct PriceAccumulator<'a> {
    representative: &'a AdRecord,
    sum: i128,
    min: i64,
    max: i64,
    count: u64,
}

impl<'a> PriceAccumulator<'a> {
    fn new(record: &'a AdRecord) -> Self {
        Self {
            representative: record,
            sum: i128::from(record.price),
            min: record.price,
            max: record.price,
            count: 1,
        }
    }

    fn add(&mut self, price: i64) {
        self.sum += i128::from(price);
        self.min = self.min.min(price);
        self.max = self.max.max(price);
        self.count += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64
    }
}

/// Tolerance in metres for a join of `joined_rows` advertisements.
#[must_use]
pub const fn simplification_tolerance(joined_rows: usize, config: &SimplificationConfig) -> f64 {
    config.tolerance_for(joined_rows)
}

/// Joins `view` with the zone boundaries and aggregates prices per postal
/// code.
///
/// Records without a boundary are dropped. Each zone takes its region from
/// the first joined record in view order. Boundaries are simplified in the
/// local UTM projection with a tolerance picked from the joined row count.
#[must_use]
pub fn aggregate_by_zone(
    view: &FilteredView<'_>,
    geometry: &ZoneGeometry,
    regions: &LookupTable,
    config: &SimplificationConfig,
) -> ZoneAggregation {
    let mut groups: BTreeMap<u32, PriceAccumulator<'_>> = BTreeMap::new();
    let mut joined_rows = 0_usize;

    for record in view.iter() {
        if !geometry.contains(record.postal_code) {
            continue;
        }
        joined_rows += 1;
        groups
            .entry(record.postal_code)
            .and_modify(|acc| acc.add(record.price))
            .or_insert_with(|| PriceAccumulator::new(record));
    }

    if groups.is_empty() {
        log::debug!("No advertisements joined a zone boundary");
        return ZoneAggregation::default();
    }

    let tolerance = simplification_tolerance(joined_rows, config);
    let simplifier = combined_extent(groups.keys().filter_map(|&code| geometry.get(code)))
        .map(|extent| ZoneSimplifier::for_extent(&extent, tolerance));

    if let Some(simplifier) = &simplifier {
        log::debug!(
            "Joined {} rows into {} zones, simplifying at {} m in EPSG:{}",
            joined_rows,
            groups.len(),
            simplifier.tolerance(),
            simplifier.zone().epsg()
        );
    }

    let zones = groups
        .into_iter()
        .filter_map(|(postal_code, acc)| {
            let boundary = geometry.get(postal_code)?;
            let simplified = simplifier
                .as_ref()
                .map_or_else(|| boundary.clone(), |s| s.simplify(boundary));
            let region_id = acc.representative.region_id;

            Some((
                postal_code,
                ZoneStats {
                    postal_code,
                    region_id,
                    region_name: regions.name_or_unknown(region_id).into_owned(),
                    avg_price: acc.mean(),
                    min_price: acc.min,
                    max_price: acc.max,
                    ad_count: acc.count,
                    geometry: simplified,
                },
            ))
        })
        .collect();

    ZoneAggregation {
        zones,
        joined_rows,
        tolerance: Some(tolerance),
    }
}
