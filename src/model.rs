//! Domain types shared by the fetcher, the rendering pipeline and the
//! placement controller.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A (latitude, longitude) pair in signed degrees.
///
/// Range checks happen only where points enter the system (see
/// [`Coordinate::validate`]); everything downstream trusts its input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Builds a coordinate from the `[lng, lat]` order used by OSRM and VROOM.
    pub fn from_lng_lat(pair: [f64; 2]) -> Self {
        Self {
            lat: pair[1],
            lng: pair[0],
        }
    }

    pub fn to_lng_lat(self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn validate(&self) -> Result<(), CoordinateError> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(CoordinateError::Latitude(self.lat));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(CoordinateError::Longitude(self.lng));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointRole {
    Start,
    Dump,
    WastePoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub coordinate: Coordinate,
    pub role: WaypointRole,
    pub name: Option<String>,
}

impl Waypoint {
    pub fn new(coordinate: Coordinate, role: WaypointRole) -> Self {
        Self {
            coordinate,
            role,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

pub type VehicleId = i64;

/// A collection vehicle. Descriptive fields are passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub plate: String,
    pub brand: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Start,
    #[serde(alias = "waste_point")]
    Job,
    Break,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub location: Coordinate,
    pub kind: StepKind,
    /// Seconds from the start of the route.
    pub arrival: i64,
    /// Service time at this step in seconds.
    pub duration: i64,
    pub job: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRoute {
    pub vehicle_id: VehicleId,
    /// Total route duration in seconds.
    pub duration: f64,
    /// Total route distance in meters.
    pub distance: f64,
    pub steps: Vec<RouteStep>,
}

impl VehicleRoute {
    pub fn coordinates(&self) -> Vec<Coordinate> {
        self.steps.iter().map(|step| step.location).collect()
    }

    pub fn job_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|step| step.kind == StepKind::Job)
            .count()
    }
}

/// Solver output: one route per vehicle that received work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub routes: Vec<VehicleRoute>,
    pub unassigned: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_bounds() {
        assert!(Coordinate::new(90.0, 180.0).validate().is_ok());
        assert!(Coordinate::new(-90.0, -180.0).validate().is_ok());
        assert!(Coordinate::new(41.0082, 28.9784).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        assert_eq!(
            Coordinate::new(95.0, 10.0).validate(),
            Err(CoordinateError::Latitude(95.0))
        );
        assert_eq!(
            Coordinate::new(10.0, -200.0).validate(),
            Err(CoordinateError::Longitude(-200.0))
        );
        assert!(Coordinate::new(f64::NAN, 0.0).validate().is_err());
    }

    #[test]
    fn test_lng_lat_order() {
        let coord = Coordinate::from_lng_lat([29.0, 41.0]);
        assert_eq!(coord.lat, 41.0);
        assert_eq!(coord.lng, 29.0);
        assert_eq!(coord.to_lng_lat(), [29.0, 41.0]);
    }

    #[test]
    fn test_step_kind_accepts_waste_point_alias() {
        let kind: StepKind = serde_json::from_str("\"waste_point\"").unwrap();
        assert_eq!(kind, StepKind::Job);
        let kind: StepKind = serde_json::from_str("\"job\"").unwrap();
        assert_eq!(kind, StepKind::Job);
    }

    #[test]
    fn test_job_count() {
        let step = |kind| RouteStep {
            location: Coordinate::new(0.0, 0.0),
            kind,
            arrival: 0,
            duration: 0,
            job: None,
        };
        let route = VehicleRoute {
            vehicle_id: 1,
            duration: 0.0,
            distance: 0.0,
            steps: vec![
                step(StepKind::Start),
                step(StepKind::Job),
                step(StepKind::Job),
                step(StepKind::End),
            ],
        };
        assert_eq!(route.job_count(), 2);
        assert_eq!(route.coordinates().len(), 4);
    }
}
