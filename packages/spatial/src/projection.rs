//! WGS84 ↔ UTM projection.
//!
//! Implements the transverse Mercator series (Snyder, *Map Projections: A
//! Working Manual*, pp. 61–64) on the WGS84 ellipsoid. Accuracy is well
//! below a millimetre inside a zone, which is far tighter than the metre
//! tolerances the zone simplifier works with.

use geo::{Coord, Rect};

const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

const E2: f64 = FLATTENING * (2.0 - FLATTENING);
const E4: f64 = E2 * E2;
const E6: f64 = E4 * E2;
const EP2: f64 = E2 / (1.0 - E2);

/// A UTM zone: 6° longitude band plus hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtmZone {
    number: u8,
    south: bool,
}

impl UtmZone {
    /// The zone containing a lon/lat position. Longitudes outside
    /// `[-180, 180]` clamp to the edge zones.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn containing(lon: f64, lat: f64) -> Self {
        let band = ((lon + 180.0) / 6.0).floor().clamp(0.0, 59.0) as u8;
        Self {
            number: band + 1,
            south: lat < 0.0,
        }
    }

    /// Picks the zone for an extent from the centre of its bounding
    /// rectangle.
    #[must_use]
    pub fn estimate(extent: &Rect<f64>) -> Self {
        let center = extent.center();
        Self::containing(center.x, center.y)
    }

    /// Zone number, 1–60.
    #[must_use]
    pub const fn number(self) -> u8 {
        self.number
    }

    /// Returns `true` for southern-hemisphere zones.
    #[must_use]
    pub const fn is_south(self) -> bool {
        self.south
    }

    /// EPSG code of the WGS84 / UTM zone (326xx north, 327xx south).
    #[must_use]
    pub fn epsg(self) -> u32 {
        let base = if self.south { 32_700 } else { 32_600 };
        base + u32::from(self.number)
    }

    /// Central meridian in degrees.
    #[must_use]
    pub fn central_meridian(self) -> f64 {
        f64::from(self.number) * 6.0 - 183.0
    }

    const fn false_northing(self) -> f64 {
        if self.south { FALSE_NORTHING_SOUTH } else { 0.0 }
    }

    /// Projects a lon/lat coordinate (degrees) to easting/northing
    /// (metres).
    #[must_use]
    pub fn project(self, coord: Coord<f64>) -> Coord<f64> {
        let lat = coord.y.to_radians();
        let dlon = (coord.x - self.central_meridian()).to_radians();

        let (sin_lat, cos_lat) = lat.sin_cos();
        let tan_lat = lat.tan();

        let n = SEMI_MAJOR_AXIS / (1.0 - E2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = EP2 * cos_lat * cos_lat;
        let a = cos_lat * dlon;
        let m = meridian_arc(lat);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = SCALE_FACTOR
            * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * EP2) * a5 / 120.0);

        let y = SCALE_FACTOR
            * (m + n
                * tan_lat
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * EP2) * a6 / 720.0));

        Coord {
            x: x + FALSE_EASTING,
            y: y + self.false_northing(),
        }
    }

    /// Inverse of [`Self::project`].
    #[must_use]
    pub fn unproject(self, coord: Coord<f64>) -> Coord<f64> {
        let x = coord.x - FALSE_EASTING;
        let y = coord.y - self.false_northing();

        let m = y / SCALE_FACTOR;
        let mu = m / (SEMI_MAJOR_AXIS * (1.0 - E2 / 4.0 - 3.0 * E4 / 64.0 - 5.0 * E6 / 256.0));

        let root = (1.0 - E2).sqrt();
        let e1 = (1.0 - root) / (1.0 + root);
        let e1_2 = e1 * e1;
        let e1_3 = e1_2 * e1;
        let e1_4 = e1_3 * e1;

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let denom = 1.0 - E2 * sin_phi1 * sin_phi1;

        let c1 = EP2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let n1 = SEMI_MAJOR_AXIS / denom.sqrt();
        let r1 = SEMI_MAJOR_AXIS * (1.0 - E2) / denom.powf(1.5);
        let d = x / (n1 * SCALE_FACTOR);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * EP2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1
                        - 252.0 * EP2
                        - 3.0 * c1 * c1)
                        * d6
                        / 720.0);

        let dlon = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * EP2 + 24.0 * t1 * t1) * d5
                / 120.0)
            / cos_phi1;

        Coord {
            x: self.central_meridian() + dlon.to_degrees(),
            y: lat.to_degrees(),
        }
    }
}

/// Distance along the meridian from the equator to latitude `lat`
/// (radians).
fn meridian_arc(lat: f64) -> f64 {
    SEMI_MAJOR_AXIS
        * ((1.0 - E2 / 4.0 - 3.0 * E4 / 64.0 - 5.0 * E6 / 256.0) * lat
            - (3.0 * E2 / 8.0 + 3.0 * E4 / 32.0 + 45.0 * E6 / 1024.0) * (2.0 * lat).sin()
            + (15.0 * E4 / 256.0 + 45.0 * E6 / 1024.0) * (4.0 * lat).sin()
            - (35.0 * E6 / 3072.0) * (6.0 * lat).sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_zone_from_longitude() {
        assert_eq!(UtmZone::containing(19.04, 47.5).number(), 34);
        assert_eq!(UtmZone::containing(16.5, 47.5).number(), 33);
        assert_eq!(UtmZone::containing(-180.0, 0.0).number(), 1);
        assert_eq!(UtmZone::containing(180.0, 0.0).number(), 60);
        assert!(UtmZone::containing(151.2, -33.9).is_south());
    }

    #[test]
    fn epsg_codes() {
        assert_eq!(UtmZone::containing(19.04, 47.5).epsg(), 32_634);
        assert_eq!(UtmZone::containing(151.2, -33.9).epsg(), 32_756);
    }

    #[test]
    fn estimates_zone_from_extent_center() {
        let hungary = Rect::new(Coord { x: 16.1, y: 45.7 }, Coord { x: 22.9, y: 48.6 });
        let zone = UtmZone::estimate(&hungary);
        assert_eq!(zone.number(), 34);
        assert!(!zone.is_south());
        assert!((zone.central_meridian() - 21.0).abs() < f64::EPSILON);
    }

    #[test]
    fn equator_on_central_meridian_maps_to_false_origin() {
        let zone = UtmZone::containing(21.0, 0.0);
        let projected = zone.project(Coord { x: 21.0, y: 0.0 });
        assert!((projected.x - FALSE_EASTING).abs() < 1e-6);
        assert!(projected.y.abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let zone = UtmZone::containing(21.0, 47.0);
        let a = zone.project(Coord { x: 21.0, y: 47.0 });
        let b = zone.project(Coord { x: 21.0, y: 48.0 });
        let distance = b.y - a.y;
        assert!((111_000.0..111_400.0).contains(&distance), "{distance}");
    }

    #[test]
    fn round_trips_within_zone() {
        for (lon, lat) in [(19.0402, 47.4979), (16.2, 46.0), (22.8, 48.5), (151.2, -33.9)] {
            let zone = UtmZone::containing(lon, lat);
            let back = zone.unproject(zone.project(Coord { x: lon, y: lat }));
            assert!((back.x - lon).abs() < 1e-6, "lon {lon} -> {}", back.x);
            assert!((back.y - lat).abs() < 1e-6, "lat {lat} -> {}", back.y);
        }
    }

    #[test]
    fn southern_zone_uses_false_northing() {
        let zone = UtmZone::containing(151.2, -33.9);
        let projected = zone.project(Coord { x: 151.2, y: -33.9 });
        assert!(projected.y > 6_000_000.0 && projected.y < FALSE_NORTHING_SOUTH);
    }
}
