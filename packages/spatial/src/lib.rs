#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory postal-code zone geometry.
//!
//! Loads postal-code polygons from a `GeoJSON` feature collection at
//! startup, builds an R-tree for point lookups, and precomputes the map
//! center from every zone. The store is never mutated after construction.

pub mod projection;
pub mod simplify;

use std::collections::BTreeMap;
use std::path::Path;

use geo::{BoundingRect, Centroid, Contains, MultiPolygon, Point};
use geojson::{Feature, GeoJson};
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

pub use projection::UtmZone;
pub use simplify::{ZoneSimplifier, combined_extent};

/// The only reference system zone files may use.
pub const WGS84: &str = "EPSG:4326";

/// Errors that can occur while loading zone geometry.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// Reading the geometry file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The `GeoJSON` document is a bare geometry or feature.
    #[error("Expected a GeoJSON FeatureCollection")]
    NotAFeatureCollection,

    /// The collection declares a reference system other than WGS84.
    #[error("Unsupported coordinate reference system: {name}")]
    UnsupportedCrs {
        /// The declared CRS name.
        name: String,
    },
}

/// A zone envelope stored in the R-tree.
struct ZoneEntry {
    postal_code: u32,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for ZoneEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Postal code → boundary polygon, in WGS84 lon/lat.
pub struct ZoneGeometry {
    crs: String,
    zones: BTreeMap<u32, MultiPolygon<f64>>,
    index: RTree<ZoneEntry>,
    center: Option<Point<f64>>,
}

impl std::fmt::Debug for ZoneGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZoneGeometry")
            .field("crs", &self.crs)
            .field("zones", &self.zones.len())
            .field("center", &self.center)
            .finish_non_exhaustive()
    }
}

impl ZoneGeometry {
    /// Reads a `GeoJSON` feature collection from disk.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the file cannot be read, is not a
    /// feature collection, or declares a non-WGS84 CRS.
    pub fn load(path: &Path) -> Result<Self, GeometryError> {
        let text = std::fs::read_to_string(path).map_err(|e| GeometryError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let geometry = Self::from_geojson_str(&text)?;
        log::info!(
            "Loaded {} postal code zones from {}",
            geometry.len(),
            path.display()
        );
        Ok(geometry)
    }

    /// Parses a `GeoJSON` feature collection whose features carry a
    /// `postal_code` property.
    ///
    /// Features without a usable postal code or (multi)polygon geometry
    /// are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError`] if the document is not a feature
    /// collection or declares a non-WGS84 CRS.
    pub fn from_geojson_str(geojson_str: &str) -> Result<Self, GeometryError> {
        let GeoJson::FeatureCollection(collection) = geojson_str.parse::<GeoJson>()? else {
            return Err(GeometryError::NotAFeatureCollection);
        };

        let crs = collection
            .foreign_members
            .as_ref()
            .and_then(|members| members.get("crs"))
            .and_then(|crs| crs.pointer("/properties/name"))
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| Ok(WGS84.to_string()), normalize_crs)?;

        let zones = collection.features.iter().filter_map(|feature| {
            let zone = parse_feature(feature);
            if zone.is_none() {
                log::warn!(
                    "Skipping zone feature without a postal code or polygon geometry: {:?}",
                    feature.property("postal_code")
                );
            }
            zone
        });

        Self::from_zones(crs, zones)
    }

    /// Builds the store from already-parsed zones.
    ///
    /// Repeated postal codes merge their polygons into one zone.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedCrs`] if `crs` is not WGS84.
    pub fn from_zones(
        crs: impl Into<String>,
        zones: impl IntoIterator<Item = (u32, MultiPolygon<f64>)>,
    ) -> Result<Self, GeometryError> {
        let crs = normalize_crs(&crs.into())?;

        let mut merged: BTreeMap<u32, MultiPolygon<f64>> = BTreeMap::new();
        let mut centroids = Vec::new();
        for (postal_code, polygon) in zones {
            centroids.extend(polygon.centroid());
            match merged.get_mut(&postal_code) {
                Some(existing) => {
                    log::debug!("Merging repeated geometry for postal code {postal_code}");
                    existing.0.extend(polygon.0);
                }
                None => {
                    merged.insert(postal_code, polygon);
                }
            }
        }

        let entries = merged
            .iter()
            .filter_map(|(&postal_code, polygon)| {
                polygon.bounding_rect().map(|rect| ZoneEntry {
                    postal_code,
                    envelope: AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ),
                })
            })
            .collect();

        let center = mean_point(&centroids);

        Ok(Self {
            crs,
            zones: merged,
            index: RTree::bulk_load(entries),
            center,
        })
    }

    /// Reference system of the stored coordinates.
    #[must_use]
    pub fn crs(&self) -> &str {
        &self.crs
    }

    /// Boundary of a postal code.
    #[must_use]
    pub fn get(&self, postal_code: u32) -> Option<&MultiPolygon<f64>> {
        self.zones.get(&postal_code)
    }

    /// Returns `true` if the postal code has a boundary.
    #[must_use]
    pub fn contains(&self, postal_code: u32) -> bool {
        self.zones.contains_key(&postal_code)
    }

    /// Number of zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns `true` if there are no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Mean of every input feature's centroid, independent of any query filter.
    ///
    /// `None` only when the table has no zones.
    #[must_use]
    pub const fn map_center(&self) -> Option<Point<f64>> {
        self.center
    }

    /// Postal code whose boundary contains the point.
    ///
    /// Postal zones tile the country without overlap, so the first match
    /// wins.
    #[must_use]
    pub fn lookup_zone(&self, lon: f64, lat: f64) -> Option<u32> {
        let point = Point::new(lon, lat);
        let query_env = AABB::from_point([lon, lat]);

        self.index
            .locate_in_envelope_intersecting(&query_env)
            .find(|entry| {
                self.zones
                    .get(&entry.postal_code)
                    .is_some_and(|polygon| polygon.contains(&point))
            })
            .map(|entry| entry.postal_code)
    }
}

fn normalize_crs(name: &str) -> Result<String, GeometryError> {
    let upper = name.to_ascii_uppercase();
    if upper.ends_with("CRS84") || upper.ends_with(":4326") || upper == "WGS84" {
        Ok(WGS84.to_string())
    } else {
        Err(GeometryError::UnsupportedCrs {
            name: name.to_string(),
        })
    }
}

fn parse_feature(feature: &Feature) -> Option<(u32, MultiPolygon<f64>)> {
    let postal_code = parse_postal_code(feature.property("postal_code")?)?;
    let geometry = feature.geometry.clone()?;
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    let polygon = match geo_geom {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
        _ => return None,
    };
    Some((postal_code, polygon))
}

/// Accepts integer numbers, integral floats and numeric strings.
fn parse_postal_code(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map_or_else(
            || {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= f64::from(u32::MAX))
                    .map(|f| {
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let code = f as u32;
                        code
                    })
            },
            |n| u32::try_from(n).ok(),
        ),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Mean of the per-feature centroids, before repeated codes are merged.
fn mean_point(points: &[Point<f64>]) -> Option<Point<f64>> {
    let count = u32::try_from(points.len()).ok().filter(|&n| n > 0)?;
    let (sum_x, sum_y) = points
        .iter()
        .fold((0.0, 0.0), |(x, y), c| (x + c.x(), y + c.y()));
    let n = f64::from(count);
    Some(Point::new(sum_x / n, sum_y / n))
}
