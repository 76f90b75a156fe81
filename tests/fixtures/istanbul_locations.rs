//! Istanbul locations for realistic test fixtures.
//!
//! Coordinates are approximate public squares and piers; good enough for
//! bounding boxes and popups, not for road-accurate routing.

#![allow(dead_code)]

use collection_planner::model::{
    Coordinate, OptimizationResult, RouteStep, StepKind, VehicleId, VehicleRoute,
};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

// ============================================================================
// Depot and dump
// ============================================================================

pub const DEPOT: Location = Location::new("Kagithane Depot", 41.0810, 28.9720);
pub const DUMP: Location = Location::new("Odayeri Landfill", 41.2360, 28.8660);

// ============================================================================
// Waste pickup points
// ============================================================================

pub const WASTE_POINTS: &[Location] = &[
    Location::new("Taksim Square", 41.0370, 28.9850),
    Location::new("Galata Tower", 41.0256, 28.9742),
    Location::new("Kadikoy Pier", 40.9910, 29.0233),
    Location::new("Besiktas Pier", 41.0422, 29.0067),
    Location::new("Sultanahmet Square", 41.0054, 28.9768),
    Location::new("Uskudar Square", 41.0262, 29.0150),
    Location::new("Eminonu", 41.0172, 28.9709),
    Location::new("Nisantasi", 41.0510, 28.9940),
    Location::new("Bakirkoy Square", 40.9800, 28.8720),
    Location::new("Levent", 41.0820, 29.0110),
];

// ============================================================================
// Builders
// ============================================================================

/// A solver route from the depot through `jobs` to the dump, ten minutes
/// between stops.
pub fn vehicle_route(vehicle_id: VehicleId, jobs: &[&Location]) -> VehicleRoute {
    let mut steps = Vec::with_capacity(jobs.len() + 2);
    steps.push(step(StepKind::Start, DEPOT.coords(), 0, None));
    for (i, job) in jobs.iter().enumerate() {
        let arrival = (i as i64 + 1) * 600;
        steps.push(step(StepKind::Job, job.coords(), arrival, Some(i as i64)));
    }
    steps.push(step(
        StepKind::End,
        DUMP.coords(),
        (jobs.len() as i64 + 1) * 600,
        None,
    ));

    VehicleRoute {
        vehicle_id,
        duration: (jobs.len() as f64 + 1.0) * 600.0,
        distance: (jobs.len() as f64 + 1.0) * 2_500.0,
        steps,
    }
}

pub fn result(routes: Vec<VehicleRoute>) -> OptimizationResult {
    OptimizationResult {
        routes,
        unassigned: Vec::new(),
    }
}

fn step(kind: StepKind, location: Coordinate, arrival: i64, job: Option<i64>) -> RouteStep {
    RouteStep {
        location,
        kind,
        arrival,
        duration: 0,
        job,
    }
}
