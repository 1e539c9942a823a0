//! Great-circle distances between points on the Earth's surface.
use serde::Deserialize;

/// Mean Earth radius used for all distances, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point given as latitude and longitude in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Distance to `other` in kilometers. See [`haversine_km`].
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        haversine_km(self, other)
    }
}

/// Great-circle distance between `from` and `to` in kilometers, using the
/// haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
///
/// ```
/// use parkingspot::{haversine_km, Coordinate};
///
/// let taipei_101 = Coordinate::new(25.0330, 121.5654);
/// let main_station = Coordinate::new(25.0478, 121.5319);
///
/// let km = haversine_km(taipei_101, main_station);
/// assert!((km - 3.755).abs() < 0.01);
/// ```
#[must_use]
pub fn haversine_km(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(feature = "geo")]
impl From<Coordinate> for geo::Point<f64> {
    fn from(value: Coordinate) -> Self {
        geo::point! { x: value.longitude, y: value.latitude }
    }
}

#[cfg(feature = "geo")]
impl From<geo::Point<f64>> for Coordinate {
    fn from(value: geo::Point<f64>) -> Self {
        Self::new(value.y(), value.x())
    }
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, Coordinate};

    const POINTS: &[Coordinate] = &[
        Coordinate::new(25.0330, 121.5654),
        Coordinate::new(25.0478, 121.5319),
        Coordinate::new(22.6273, 120.3014),
        Coordinate::new(-33.8688, 151.2093),
        Coordinate::new(51.5074, -0.1278),
        Coordinate::new(0.0, 179.9),
        Coordinate::new(0.0, -179.9),
        Coordinate::new(89.9, 0.0),
    ];

    #[test]
    fn symmetric() {
        for &a in POINTS {
            for &b in POINTS {
                let ab = haversine_km(a, b);
                let ba = haversine_km(b, a);
                assert!((ab - ba).abs() < 1e-9, "{a:?} <-> {b:?}: {ab} != {ba}");
            }
        }
    }

    #[test]
    fn same_point_is_zero() {
        for &a in POINTS {
            assert!(haversine_km(a, a).abs() < f64::EPSILON, "{a:?}");
        }
    }

    #[test]
    fn taipei_reference() {
        let km = haversine_km(POINTS[0], POINTS[1]);
        assert!((km - 3.7548).abs() < 0.01, "got {km}");
    }

    #[test]
    fn across_antimeridian() {
        // 0.2 degrees of longitude on the equator, not 359.8
        let km = Coordinate::new(0.0, 179.9).distance_to(Coordinate::new(0.0, -179.9));
        assert!((km - 22.239).abs() < 0.01, "got {km}");
    }

    #[cfg(feature = "geo")]
    #[test]
    fn geo_point_axes() {
        let kaohsiung = POINTS[2];
        let point: geo::Point<f64> = kaohsiung.into();

        assert_eq!(point.x(), kaohsiung.longitude);
        assert_eq!(point.y(), kaohsiung.latitude);
        assert_eq!(Coordinate::from(point), kaohsiung);
    }
}
