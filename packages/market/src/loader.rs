//! CSV readers for the advertisement snapshots and lookup tables.
//!
//! The 2020 export writes dates day-first and is UTF-8; the 2023 export and
//! the lookup tables are Latin-1 with ISO dates. Every file is decoded as
//! UTF-8 first and falls back to Latin-1, so callers never have to know
//! which encoding a given export used.

use std::path::Path;

use car_market_models::{AdRecord, SaleTracking, SnapshotYear};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use crate::{LookupTable, MarketError};

/// Cell values that mean "missing".
const MISSING_VALUES: &[&str] = &["", "NA"];

const DAY_FIRST_DATETIME_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DAY_FIRST_DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%d.%m.%Y", "%d-%m-%Y"];

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d"];

/// How ambiguous numeric dates in a file are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// `dd/mm/yyyy`, falling back to ISO.
    DayFirst,
    /// ISO `yyyy-mm-dd` only.
    Iso,
}

impl DateOrder {
    /// The date order used by each snapshot export.
    #[must_use]
    pub const fn for_year(year: SnapshotYear) -> Self {
        match year {
            SnapshotYear::Y2020 => Self::DayFirst,
            SnapshotYear::Y2023 => Self::Iso,
        }
    }
}

/// One advertisement row as it appears in either export.
#[derive(Debug, Deserialize)]
struct RawAdRow {
    ad_id: i64,
    #[serde(alias = "region")]
    region_id: i32,
    ad_price: i64,
    numpictures: i32,
    proseller: String,
    adoldness: i32,
    postal_code: u32,
    mileage: i64,
    clime_id: i32,
    #[serde(default)]
    shifter: Option<String>,
    person_capacity: i32,
    doorsnumber: i32,
    color: i32,
    brand_id: i32,
    model_id: i32,
    ccm: i32,
    highlighted: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    advertisement_url: Option<String>,
    #[serde(default)]
    catalog_url: Option<String>,
    #[serde(default)]
    is_sold: Option<String>,
    #[serde(default)]
    production: Option<String>,
    #[serde(default)]
    documentvalid: Option<String>,
    #[serde(default)]
    sales_date: Option<String>,
    #[serde(default)]
    download_date: Option<String>,
    #[serde(default)]
    sales_update_date: Option<String>,
    #[serde(default)]
    upload_date: Option<String>,
}

impl RawAdRow {
    fn into_record(self, year: SnapshotYear) -> Result<AdRecord, MarketError> {
        let order = DateOrder::for_year(year);

        let sale_tracking = match year {
            SnapshotYear::Y2020 => Some(SaleTracking {
                upload_date: datetime_cell("upload_date", self.upload_date.as_deref(), order)?,
                sales_date: datetime_cell("sales_date", self.sales_date.as_deref(), order)?,
                sales_update_date: datetime_cell(
                    "sales_update_date",
                    self.sales_update_date.as_deref(),
                    order,
                )?,
                download_date: datetime_cell(
                    "download_date",
                    self.download_date.as_deref(),
                    order,
                )?,
            }),
            SnapshotYear::Y2023 => None,
        };

        Ok(AdRecord {
            ad_id: self.ad_id,
            region_id: self.region_id,
            postal_code: self.postal_code,
            brand_id: self.brand_id,
            model_id: self.model_id,
            price: self.ad_price,
            mileage: self.mileage,
            production: date_cell("production", self.production.as_deref(), order)?,
            document_valid: date_cell("documentvalid", self.documentvalid.as_deref(), order)?,
            adoldness: self.adoldness,
            ccm: self.ccm,
            professional_seller: bool_cell("proseller", &self.proseller)?,
            highlighted: bool_cell("highlighted", &self.highlighted)?,
            sold: self
                .is_sold
                .as_deref()
                .filter(|v| !is_missing(v))
                .map(|v| bool_cell("is_sold", v))
                .transpose()?
                .unwrap_or(false),
            pictures: self.numpictures,
            person_capacity: self.person_capacity,
            doors: self.doorsnumber,
            color: self.color,
            climate_id: self.clime_id,
            shifter: text_cell(self.shifter),
            description: text_cell(self.description),
            advertisement_url: text_cell(self.advertisement_url),
            catalog_url: text_cell(self.catalog_url),
            sale_tracking,
        })
    }
}

/// Reads a snapshot export from disk.
///
/// # Errors
///
/// Returns [`MarketError`] if the file cannot be read or any row is
/// malformed.
pub fn read_snapshot(path: &Path, year: SnapshotYear) -> Result<Vec<AdRecord>, MarketError> {
    let text = read_text(path)?;
    parse_snapshot(&text, year)
}

/// Parses a snapshot export held in memory.
///
/// # Errors
///
/// Returns [`MarketError`] if any row is malformed.
pub fn parse_snapshot(csv_text: &str, year: SnapshotYear) -> Result<Vec<AdRecord>, MarketError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    reader
        .deserialize::<RawAdRow>()
        .map(|row| row?.into_record(year))
        .collect()
}

/// Reads a two-column `id,name` lookup CSV from disk.
///
/// # Errors
///
/// Returns [`MarketError`] if the file cannot be read or a row is
/// malformed.
pub fn read_lookup(path: &Path) -> Result<LookupTable, MarketError> {
    let text = read_text(path)?;
    parse_lookup(&text, &path.display().to_string())
}

/// Parses a two-column `id,name` lookup CSV. Column names are ignored;
/// `source` only labels errors.
///
/// # Errors
///
/// Returns [`MarketError`] if a row has no id, a non-integer id, or no
/// name.
pub fn parse_lookup(csv_text: &str, source: &str) -> Result<LookupTable, MarketError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(csv_text.as_bytes());

    let mut entries = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let lookup_error = |message: String| MarketError::Lookup {
            path: source.to_string(),
            message: format!("row {}: {message}", line + 1),
        };

        let id = record
            .get(0)
            .ok_or_else(|| lookup_error("missing id".to_string()))?;
        let id: i32 = id
            .parse()
            .map_err(|e| lookup_error(format!("invalid id '{id}': {e}")))?;
        let name = record
            .get(1)
            .ok_or_else(|| lookup_error(format!("missing name for id {id}")))?;

        entries.push((id, name.to_string()));
    }

    Ok(LookupTable::from_entries(entries))
}

/// Parses a date or datetime cell. Missing cells yield `None`.
#[must_use]
pub fn parse_datetime(value: &str, order: DateOrder) -> Option<NaiveDateTime> {
    let value = value.trim();

    if order == DateOrder::DayFirst {
        if let Some(dt) = first_datetime(value, DAY_FIRST_DATETIME_FORMATS) {
            return Some(dt);
        }
        if let Some(date) = first_date(value, DAY_FIRST_DATE_FORMATS) {
            return Some(date.and_time(chrono::NaiveTime::MIN));
        }
    }

    first_datetime(value, ISO_DATETIME_FORMATS).or_else(|| {
        first_date(value, ISO_DATE_FORMATS).map(|date| date.and_time(chrono::NaiveTime::MIN))
    })
}

fn first_datetime(value: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

fn first_date(value: &str, formats: &[&str]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn is_missing(value: &str) -> bool {
    MISSING_VALUES.contains(&value.trim())
}

fn datetime_cell(
    column: &'static str,
    value: Option<&str>,
    order: DateOrder,
) -> Result<Option<NaiveDateTime>, MarketError> {
    match value {
        None => Ok(None),
        Some(v) if is_missing(v) => Ok(None),
        Some(v) => parse_datetime(v, order)
            .map(Some)
            .ok_or_else(|| MarketError::InvalidDate {
                column,
                value: v.to_string(),
            }),
    }
}

fn date_cell(
    column: &'static str,
    value: Option<&str>,
    order: DateOrder,
) -> Result<Option<NaiveDate>, MarketError> {
    Ok(datetime_cell(column, value, order)?.map(|dt| dt.date()))
}

fn bool_cell(column: &'static str, value: &str) -> Result<bool, MarketError> {
    match value.trim() {
        "True" | "true" | "TRUE" | "1" => Ok(true),
        "False" | "false" | "FALSE" | "0" => Ok(false),
        other => Err(MarketError::InvalidBool {
            column,
            value: other.to_string(),
        }),
    }
}

fn text_cell(value: Option<String>) -> String {
    value.filter(|v| !is_missing(v)).unwrap_or_default()
}

/// Reads a file as UTF-8, falling back to Latin-1.
fn read_text(path: &Path) -> Result<String, MarketError> {
    let bytes = std::fs::read(path).map_err(|e| MarketError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(String::from_utf8(bytes).unwrap_or_else(|e| {
        log::debug!("{} is not UTF-8, decoding as Latin-1", path.display());
        decode_latin1(e.as_bytes())
    }))
}

/// Latin-1 maps every byte to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
