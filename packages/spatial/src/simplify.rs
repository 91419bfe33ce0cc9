//! Metric-space simplification of zone boundaries.
//!
//! Zone polygons are stored in geographic coordinates, where a tolerance
//! in degrees means different ground distances at different latitudes.
//! [`ZoneSimplifier`] projects into the UTM zone estimated for the whole
//! batch, runs Ramer–Douglas–Peucker with a tolerance in metres, and
//! projects the result back.

use geo::{
    BoundingRect, Coord, LineString, MapCoords, MultiPolygon, Polygon, Rect, Simplify, Validation,
};

use crate::projection::UtmZone;

/// Smallest coordinate count of a closed ring.
const MIN_RING_COORDS: usize = 4;

/// Simplifies a batch of zone geometries in a shared UTM projection.
#[derive(Debug, Clone, Copy)]
pub struct ZoneSimplifier {
    zone: UtmZone,
    tolerance: f64,
}

impl ZoneSimplifier {
    /// Builds a simplifier for geometries covering `extent`, with
    /// `tolerance` in metres.
    #[must_use]
    pub fn for_extent(extent: &Rect<f64>, tolerance: f64) -> Self {
        Self {
            zone: UtmZone::estimate(extent),
            tolerance,
        }
    }

    /// The projection the batch is simplified in.
    #[must_use]
    pub const fn zone(&self) -> UtmZone {
        self.zone
    }

    /// Tolerance in metres.
    #[must_use]
    pub const fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Simplifies one geometry and returns it in lon/lat.
    ///
    /// Rings that would collapse below a valid ring are kept as they were:
    /// an exterior keeps its whole polygon unsimplified, an interior ring is
    /// kept unsimplified. A polygon whose simplified rings would cross each
    /// other or themselves is kept unsimplified, so valid input always
    /// yields valid output.
    #[must_use]
    pub fn simplify(&self, geometry: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        let zone = self.zone;
        let projected = geometry.map_coords(move |c| zone.project(c));

        let simplified = MultiPolygon(
            projected
                .iter()
                .map(|polygon| self.simplify_polygon(polygon))
                .collect(),
        );

        simplified.map_coords(move |c| zone.unproject(c))
    }

    fn simplify_polygon(&self, polygon: &Polygon<f64>) -> Polygon<f64> {
        let exterior = polygon.exterior().simplify(self.tolerance);
        if exterior.0.len() < MIN_RING_COORDS {
            return polygon.clone();
        }

        let interiors = polygon
            .interiors()
            .iter()
            .map(|ring| {
                let simplified: LineString<f64> = ring.simplify(self.tolerance);
                if simplified.0.len() < MIN_RING_COORDS {
                    ring.clone()
                } else {
                    simplified
                }
            })
            .collect();

        let simplified = Polygon::new(exterior, interiors);
        if simplified.is_valid() {
            simplified
        } else {
            log::debug!("Keeping polygon unsimplified, simplification made it invalid");
            polygon.clone()
        }
    }
}

/// Bounding rectangle enclosing every geometry, or `None` if there are no
/// non-empty geometries.
pub fn combined_extent<'a>(
    geometries: impl IntoIterator<Item = &'a MultiPolygon<f64>>,
) -> Option<Rect<f64>> {
    geometries
        .into_iter()
        .filter_map(|geometry| geometry.bounding_rect())
        .reduce(|acc, rect| {
            Rect::new(
                Coord {
                    x: acc.min().x.min(rect.min().x),
                    y: acc.min().y.min(rect.min().y),
                },
                Coord {
                    x: acc.max().x.max(rect.max().x),
                    y: acc.max().y.max(rect.max().y),
                },
            )
        })
}
