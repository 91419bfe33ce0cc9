//! Small in-memory market shared by the unit tests.

use car_market::{LookupTable, SnapshotStore};
use car_market_models::AdRecord;
use car_market_spatial::{WGS84, ZoneGeometry};
use chrono::NaiveDate;
use geo::{MultiPolygon, polygon};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn ad(ad_id: i64, region_id: i32, postal_code: u32, brand_id: i32, price: i64) -> AdRecord {
    AdRecord {
        ad_id,
        region_id,
        postal_code,
        brand_id,
        model_id: brand_id * 10,
        price,
        ..AdRecord::default()
    }
}

pub fn regions() -> LookupTable {
    LookupTable::from_entries([(1, "Budapest".to_string()), (2, "Csongrád".to_string())])
}

pub fn brands() -> LookupTable {
    LookupTable::from_entries([
        (10, "Opel".to_string()),
        (11, "Suzuki".to_string()),
        (12, "Audi".to_string()),
    ])
}

pub fn models() -> LookupTable {
    LookupTable::from_entries([
        (100, "Astra".to_string()),
        (110, "Swift".to_string()),
        (120, "A4".to_string()),
    ])
}

pub fn ads_2020() -> Vec<AdRecord> {
    vec![
        AdRecord {
            professional_seller: true,
            production: Some(date(2010, 5, 1)),
            mileage: 150_000,
            ccm: 1_600,
            ..ad(5, 1, 1011, 10, 1_000_000)
        },
        AdRecord {
            professional_seller: true,
            production: Some(date(2015, 1, 1)),
            mileage: 80_000,
            ccm: 1_400,
            ..ad(2, 1, 1011, 10, 3_000_000)
        },
        AdRecord {
            production: Some(date(1900, 1, 1)),
            mileage: 120_000,
            ccm: 1_300,
            ..ad(9, 2, 6720, 11, 2_000_000)
        },
        AdRecord {
            mileage: 10_000,
            ccm: 2_000,
            ..ad(1, 1, 9999, 12, 5_000_000)
        },
        AdRecord {
            professional_seller: true,
            production: Some(date(1900, 1, 2)),
            mileage: 200_000,
            ccm: 1_800,
            ..ad(7, 2, 6720, 10, 4_000_000)
        },
    ]
}

pub fn ads_2023() -> Vec<AdRecord> {
    vec![
        AdRecord {
            production: Some(date(2018, 3, 1)),
            mileage: 40_000,
            ..ad(20, 1, 1011, 11, 2_500_000)
        },
        AdRecord {
            professional_seller: true,
            production: Some(date(2020, 7, 1)),
            mileage: 15_000,
            ..ad(21, 3, 6720, 12, 6_000_000)
        },
        AdRecord {
            production: Some(date(2012, 1, 1)),
            mileage: 160_000,
            ..ad(22, 2, 6720, 10, 1_500_000)
        },
    ]
}

pub fn store_from(ads_2020: Vec<AdRecord>, ads_2023: Vec<AdRecord>) -> SnapshotStore {
    SnapshotStore::new(ads_2020, ads_2023, regions(), brands(), models())
}

pub fn store() -> SnapshotStore {
    store_from(ads_2020(), ads_2023())
}

fn square(lon: f64, lat: f64, size: f64) -> MultiPolygon<f64> {
    MultiPolygon(vec![polygon![
        (x: lon, y: lat),
        (x: lon + size, y: lat),
        (x: lon + size, y: lat + size),
        (x: lon, y: lat + size),
        (x: lon, y: lat),
    ]])
}

/// Zones for 1011 (Budapest), 1012 (Budapest, no ads) and 6720 (Szeged).
pub fn geometry() -> ZoneGeometry {
    ZoneGeometry::from_zones(
        WGS84,
        [
            (1011, square(19.03, 47.49, 0.02)),
            (1012, square(19.01, 47.49, 0.02)),
            (6720, square(20.14, 46.24, 0.02)),
        ],
    )
    .unwrap()
}
