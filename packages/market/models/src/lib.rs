#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Used-car advertisement records and query criteria.
//!
//! These types describe a single advertisement as it appears in one of the
//! two market snapshots, and the criteria the presentation layer sends to
//! narrow a snapshot down before aggregation.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

/// Which market snapshot a query runs against.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SnapshotYear {
    /// The June 2020 scrape, which also tracks sale timestamps.
    #[default]
    #[serde(rename = "2020")]
    Y2020,
    /// The 2023 scrape.
    #[serde(rename = "2023")]
    Y2023,
}

impl SnapshotYear {
    /// Both snapshots, oldest first.
    pub const ALL: [Self; 2] = [Self::Y2020, Self::Y2023];

    /// Resolves a year label from the presentation layer.
    ///
    /// Only the literal `"2020"` selects the 2020 snapshot. Every other
    /// value, including garbage, selects 2023.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        if label == "2020" { Self::Y2020 } else { Self::Y2023 }
    }

    /// The label shown in the year picker.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Y2020 => "2020",
            Self::Y2023 => "2023",
        }
    }
}

impl std::fmt::Display for SnapshotYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Tri-state filter on the professional-seller flag.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum SellerFilter {
    /// No predicate on the seller flag.
    #[default]
    #[strum(to_string = "all", serialize = "ÖSSZES")]
    All,
    /// Dealer listings only.
    #[strum(to_string = "true")]
    ProfessionalOnly,
    /// Private listings only.
    #[strum(to_string = "false")]
    PrivateOnly,
}

impl SellerFilter {
    /// Parses the dropdown literal (`"all"`, `"ÖSSZES"`, `"true"`, `"false"`).
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError::UnknownSellerFilter`] for any other value.
    pub fn parse(value: &str) -> Result<Self, CriteriaError> {
        value
            .parse()
            .map_err(|_| CriteriaError::UnknownSellerFilter {
                value: value.to_string(),
            })
    }

    /// Returns `true` if a record with the given flag passes this filter.
    #[must_use]
    pub const fn matches(self, professional_seller: bool) -> bool {
        match self {
            Self::All => true,
            Self::ProfessionalOnly => professional_seller,
            Self::PrivateOnly => !professional_seller,
        }
    }
}

/// Criteria values outside their documented domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    /// The seller dropdown sent something other than all/true/false.
    #[error("unknown seller filter '{value}': expected all, true or false")]
    UnknownSellerFilter {
        /// The rejected literal.
        value: String,
    },
}

/// Id used by the lookup dropdowns to mean "no filter".
pub const NO_FILTER_ID: i32 = -1;

/// Filter criteria for a single query. Every present constraint must hold.
///
/// `None` means "no filter" for that field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Snapshot to query.
    pub year: SnapshotYear,
    /// Region (county) id.
    pub region_id: Option<i32>,
    /// Professional-seller flag.
    pub seller: SellerFilter,
    /// Postal code.
    pub postal_code: Option<u32>,
    /// Brand id.
    pub brand_id: Option<i32>,
    /// Model id.
    pub model_id: Option<i32>,
}

impl FilterCriteria {
    /// Criteria selecting the whole snapshot for `year`.
    #[must_use]
    pub fn for_year(year: SnapshotYear) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }

    /// Restricts to one region.
    #[must_use]
    pub const fn with_region(mut self, region_id: i32) -> Self {
        self.region_id = Some(region_id);
        self
    }

    /// Restricts the seller flag.
    #[must_use]
    pub const fn with_seller(mut self, seller: SellerFilter) -> Self {
        self.seller = seller;
        self
    }

    /// Restricts to one postal code.
    #[must_use]
    pub const fn with_postal_code(mut self, postal_code: u32) -> Self {
        self.postal_code = Some(postal_code);
        self
    }

    /// Restricts to one brand.
    #[must_use]
    pub const fn with_brand(mut self, brand_id: i32) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    /// Restricts to one model.
    #[must_use]
    pub const fn with_model(mut self, model_id: i32) -> Self {
        self.model_id = Some(model_id);
        self
    }

    /// Decodes the raw dropdown values the dashboard sends.
    ///
    /// Ids of `0` or [`NO_FILTER_ID`] and a postal code of `0` mean "no
    /// filter", as do missing values.
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError`] if the seller literal is not recognized.
    pub fn from_dropdowns(
        year: &str,
        region_id: Option<i32>,
        seller: &str,
        postal_code: Option<u32>,
        brand_id: Option<i32>,
        model_id: Option<i32>,
    ) -> Result<Self, CriteriaError> {
        Ok(Self {
            year: SnapshotYear::from_label(year),
            region_id: active_id(region_id),
            seller: SellerFilter::parse(seller)?,
            postal_code: postal_code.filter(|&code| code != 0),
            brand_id: active_id(brand_id),
            model_id: active_id(model_id),
        })
    }

    /// Returns `true` if `record` satisfies every present constraint.
    #[must_use]
    pub fn matches(&self, record: &AdRecord) -> bool {
        self.region_id.is_none_or(|id| record.region_id == id)
            && self.seller.matches(record.professional_seller)
            && self.postal_code.is_none_or(|code| record.postal_code == code)
            && self.brand_id.is_none_or(|id| record.brand_id == id)
            && self.model_id.is_none_or(|id| record.model_id == id)
    }
}

fn active_id(id: Option<i32>) -> Option<i32> {
    id.filter(|&id| id != 0 && id != NO_FILTER_ID)
}

/// Sale-tracking timestamps. Only the 2020 scrape recorded these.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleTracking {
    /// When the advertisement was uploaded.
    pub upload_date: Option<NaiveDateTime>,
    /// When the car was marked sold.
    pub sales_date: Option<NaiveDateTime>,
    /// Last update of the sale status.
    pub sales_update_date: Option<NaiveDateTime>,
    /// When the scraper downloaded the advertisement.
    pub download_date: Option<NaiveDateTime>,
}

/// A single used-car advertisement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdRecord {
    /// Advertisement identifier.
    pub ad_id: i64,
    /// Region (county) id.
    pub region_id: i32,
    /// Four-digit postal code of the listing.
    pub postal_code: u32,
    /// Brand id.
    pub brand_id: i32,
    /// Model id.
    pub model_id: i32,
    /// Asking price in HUF.
    pub price: i64,
    /// Odometer reading in km.
    pub mileage: i64,
    /// Production date, if known.
    pub production: Option<NaiveDate>,
    /// Expiry of the roadworthiness document, if any.
    pub document_valid: Option<NaiveDate>,
    /// Days since the advertisement was first published.
    pub adoldness: i32,
    /// Engine displacement in cubic centimetres.
    pub ccm: i32,
    /// Dealer listing.
    pub professional_seller: bool,
    /// Paid highlight.
    pub highlighted: bool,
    /// Marked sold.
    pub sold: bool,
    /// Number of pictures.
    pub pictures: i32,
    /// Seats.
    pub person_capacity: i32,
    /// Doors.
    pub doors: i32,
    /// Color code.
    pub color: i32,
    /// Climate-control code.
    pub climate_id: i32,
    /// Transmission description.
    pub shifter: String,
    /// Free-text description.
    pub description: String,
    /// Link to the advertisement.
    pub advertisement_url: String,
    /// Link to the catalog entry.
    pub catalog_url: String,
    /// 2020-only sale tracking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_tracking: Option<SaleTracking>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_literal_2020_selects_2020() {
        assert_eq!(SnapshotYear::from_label("2020"), SnapshotYear::Y2020);
        assert_eq!(SnapshotYear::from_label("2023"), SnapshotYear::Y2023);
        assert_eq!(SnapshotYear::from_label("2021"), SnapshotYear::Y2023);
        assert_eq!(SnapshotYear::from_label(" 2020"), SnapshotYear::Y2023);
        assert_eq!(SnapshotYear::from_label(""), SnapshotYear::Y2023);
    }

    #[test]
    fn default_year_is_2020() {
        assert_eq!(FilterCriteria::default().year, SnapshotYear::Y2020);
    }

    #[test]
    fn parses_seller_literals() {
        assert_eq!(SellerFilter::parse("ÖSSZES").unwrap(), SellerFilter::All);
        assert_eq!(SellerFilter::parse("all").unwrap(), SellerFilter::All);
        assert_eq!(
            SellerFilter::parse("True").unwrap(),
            SellerFilter::ProfessionalOnly
        );
        assert_eq!(
            SellerFilter::parse("false").unwrap(),
            SellerFilter::PrivateOnly
        );
        assert!(matches!(
            SellerFilter::parse("maybe"),
            Err(CriteriaError::UnknownSellerFilter { value }) if value == "maybe"
        ));
    }

    #[test]
    fn seller_filter_displays_dropdown_literal() {
        assert_eq!(SellerFilter::All.to_string(), "all");
        assert_eq!(SellerFilter::ProfessionalOnly.to_string(), "true");
        assert_eq!(SellerFilter::PrivateOnly.as_ref(), "false");
    }

    #[test]
    fn dropdown_sentinels_mean_no_filter() {
        let criteria =
            FilterCriteria::from_dropdowns("2020", Some(-1), "ÖSSZES", Some(0), Some(-1), None)
                .unwrap();
        assert_eq!(criteria, FilterCriteria::for_year(SnapshotYear::Y2020));

        let criteria =
            FilterCriteria::from_dropdowns("x", Some(0), "all", None, Some(0), Some(-1)).unwrap();
        assert_eq!(criteria, FilterCriteria::for_year(SnapshotYear::Y2023));
    }

    #[test]
    fn dropdown_values_become_constraints() {
        let criteria =
            FilterCriteria::from_dropdowns("2023", Some(3), "true", Some(1011), Some(7), Some(42))
                .unwrap();
        assert_eq!(
            criteria,
            FilterCriteria::for_year(SnapshotYear::Y2023)
                .with_region(3)
                .with_seller(SellerFilter::ProfessionalOnly)
                .with_postal_code(1011)
                .with_brand(7)
                .with_model(42)
        );
    }

    #[test]
    fn criteria_match_is_conjunctive() {
        let record = AdRecord {
            region_id: 2,
            brand_id: 5,
            professional_seller: true,
            ..AdRecord::default()
        };

        assert!(FilterCriteria::default().matches(&record));
        assert!(FilterCriteria::default().with_region(2).matches(&record));
        assert!(
            FilterCriteria::default()
                .with_region(2)
                .with_brand(5)
                .with_seller(SellerFilter::ProfessionalOnly)
                .matches(&record)
        );
        assert!(
            !FilterCriteria::default()
                .with_region(2)
                .with_brand(6)
                .matches(&record)
        );
        assert!(
            !FilterCriteria::default()
                .with_seller(SellerFilter::PrivateOnly)
                .matches(&record)
        );
    }

    #[test]
    fn year_serializes_as_label() {
        let json = serde_json::to_string(&SnapshotYear::Y2023).unwrap();
        assert_eq!(json, "\"2023\"");
    }
}
