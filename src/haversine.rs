//! Straight-line route estimates (used when the geometry engine is unavailable).
//!
//! Uses great-circle distance and an assumed speed. Ignores roads, so the
//! numbers are only a rough indication for fallback routes.

use crate::model::Coordinate;

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, Copy)]
pub struct HaversineEstimator {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineEstimator {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineEstimator {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Total length of the path in meters, leg by leg in the given order.
    pub fn path_length_m(points: &[Coordinate]) -> f64 {
        points
            .windows(2)
            .map(|leg| haversine_m(leg[0], leg[1]))
            .sum()
    }

    /// Returns `(distance_m, duration_s)` for travelling the path in order.
    pub fn estimate(&self, points: &[Coordinate]) -> (f64, f64) {
        let meters = Self::path_length_m(points);
        (meters, self.meters_to_seconds(meters))
    }

    fn meters_to_seconds(&self, meters: f64) -> f64 {
        let hours = meters / 1000.0 / self.speed_kmh;
        hours * 3600.0
    }
}

/// Great-circle distance between two points in meters.
pub fn haversine_m(from: Coordinate, to: Coordinate) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}
