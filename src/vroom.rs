//! VROOM HTTP adapter: submits a collection problem and reads back per-vehicle
//! stop sequences.
//!
//! The solver's stop order is authoritative and is never rearranged here.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::backend::WastePointRecord;
use crate::model::{Coordinate, OptimizationResult, RouteStep, StepKind, Vehicle, VehicleRoute};

#[derive(Debug, Clone)]
pub struct VroomConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for VroomConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("solver answered HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("solver error {code}: {message}")]
    Solver { code: i32, message: String },
}

/// Everything the solver needs for one run: every vehicle leaves `start`,
/// serves some of the waste points, and ends at `dump`.
#[derive(Debug, Clone, Copy)]
pub struct CollectionProblem<'a> {
    pub vehicles: &'a [Vehicle],
    pub waste_points: &'a [WastePointRecord],
    pub start: Coordinate,
    pub dump: Coordinate,
}

#[derive(Debug, Serialize)]
struct VroomRequest {
    jobs: Vec<VroomJob>,
    vehicles: Vec<VroomVehicle>,
}

#[derive(Debug, Serialize)]
struct VroomJob {
    id: i64,
    location: [f64; 2],
}

#[derive(Debug, Serialize)]
struct VroomVehicle {
    id: i64,
    start: [f64; 2],
    end: [f64; 2],
}

impl From<&CollectionProblem<'_>> for VroomRequest {
    fn from(problem: &CollectionProblem<'_>) -> Self {
        let jobs = problem
            .waste_points
            .iter()
            .map(|point| VroomJob {
                id: point.id,
                location: point.coordinate().to_lng_lat(),
            })
            .collect();

        let vehicles = problem
            .vehicles
            .iter()
            .map(|vehicle| VroomVehicle {
                id: vehicle.id,
                start: problem.start.to_lng_lat(),
                end: problem.dump.to_lng_lat(),
            })
            .collect();

        Self { jobs, vehicles }
    }
}

#[derive(Debug, Deserialize)]
struct VroomResponse {
    code: i32,
    error: Option<String>,
    #[serde(default)]
    routes: Vec<VroomRoute>,
    #[serde(default)]
    unassigned: Vec<VroomUnassigned>,
}

#[derive(Debug, Deserialize)]
struct VroomRoute {
    vehicle: i64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    distance: f64,
    steps: Vec<VroomStep>,
}

#[derive(Debug, Deserialize)]
struct VroomStep {
    #[serde(rename = "type")]
    kind: StepKind,
    location: Option<[f64; 2]>,
    #[serde(default)]
    arrival: i64,
    #[serde(default)]
    duration: i64,
    id: Option<i64>,
    job: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct VroomUnassigned {
    id: i64,
}

impl VroomResponse {
    fn into_result(self) -> Result<OptimizationResult, SolverError> {
        if self.code != 0 {
            return Err(SolverError::Solver {
                code: self.code,
                message: self.error.unwrap_or_default(),
            });
        }

        let routes = self
            .routes
            .into_iter()
            .map(|route| {
                let vehicle = route.vehicle;
                let steps = route
                    .steps
                    .into_iter()
                    .filter_map(|step| {
                        let Some(location) = step.location else {
                            warn!(vehicle, kind = ?step.kind, "solver step without location, skipping");
                            return None;
                        };
                        Some(RouteStep {
                            location: Coordinate::from_lng_lat(location),
                            kind: step.kind,
                            arrival: step.arrival,
                            duration: step.duration,
                            job: step.job.or(step.id),
                        })
                    })
                    .collect();
                VehicleRoute {
                    vehicle_id: vehicle,
                    duration: route.duration,
                    distance: route.distance,
                    steps,
                }
            })
            .collect();

        Ok(OptimizationResult {
            routes,
            unassigned: self.unassigned.into_iter().map(|job| job.id).collect(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct VroomClient {
    config: VroomConfig,
    client: reqwest::Client,
}

impl VroomClient {
    pub fn new(config: VroomConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub async fn optimize(
        &self,
        problem: &CollectionProblem<'_>,
    ) -> Result<OptimizationResult, SolverError> {
        let request = VroomRequest::from(problem);
        debug!(
            jobs = request.jobs.len(),
            vehicles = request.vehicles.len(),
            "submitting collection problem"
        );

        let response = self
            .client
            .post(&self.config.url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SolverError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result = response.json::<VroomResponse>().await?.into_result()?;
        info!(
            routes = result.routes.len(),
            unassigned = result.unassigned.len(),
            "optimization finished"
        );
        Ok(result)
    }
}
