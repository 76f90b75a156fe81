//! Seams between the planner and its external collaborators.
//!
//! HTTP clients in this crate implement these; tests substitute their own.
#![allow(async_fn_in_trait)]

use crate::backend::{BackendError, PointRecord, WastePointRecord};
use crate::model::Coordinate;
use crate::osrm::{EngineRoute, RoutingError};

/// Produces road geometry for an ordered list of stops.
///
/// Implementations must keep the stop order as given.
pub trait RoutingEngine {
    async fn route(&self, waypoints: &[Coordinate]) -> Result<EngineRoute, RoutingError>;
}

/// Persists points placed on the map. Each call echoes the stored record.
pub trait PointStore {
    async fn save_start_point(&self, point: Coordinate) -> Result<PointRecord, BackendError>;

    async fn save_dump_point(&self, point: Coordinate) -> Result<PointRecord, BackendError>;

    async fn add_waste_point(
        &self,
        name: &str,
        point: Coordinate,
    ) -> Result<WastePointRecord, BackendError>;
}
