//! Per-vehicle route summaries shown next to the map.

use serde::Serialize;

use crate::model::{Vehicle, VehicleId, VehicleRoute};

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStatistic {
    pub vehicle_id: VehicleId,
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub stops: usize,
    pub duration_min: i64,
    pub distance_km: String,
}

/// One row per route, in result order. Vehicles missing from `vehicles`
/// (or with blank details) are labelled "Unknown".
pub fn route_statistics(routes: &[VehicleRoute], vehicles: &[Vehicle]) -> Vec<RouteStatistic> {
    routes
        .iter()
        .map(|route| {
            let vehicle = vehicles.iter().find(|v| v.id == route.vehicle_id);
            RouteStatistic {
                vehicle_id: route.vehicle_id,
                plate: known(vehicle.map(|v| v.plate.as_str())),
                brand: known(vehicle.and_then(|v| v.brand.as_deref())),
                model: known(vehicle.and_then(|v| v.model.as_deref())),
                stops: route.job_count(),
                duration_min: (route.duration / 60.0).round() as i64,
                distance_km: format!("{:.1}", route.distance / 1000.0),
            }
        })
        .collect()
}

fn known(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => UNKNOWN.to_string(),
    }
}
