//! OSRM HTTP adapter for route geometries.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::model::Coordinate;
use crate::polyline::{self, Polyline, PolylineError};
use crate::traits::RoutingEngine;

/// The `code` OSRM reports on success.
pub const OSRM_OK: &str = "Ok";

/// Geometry encoding requested from the `route` service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryFormat {
    GeoJson,
    Polyline,
    Polyline6,
}

impl GeometryFormat {
    fn query_value(self) -> &'static str {
        match self {
            GeometryFormat::GeoJson => "geojson",
            GeometryFormat::Polyline => "polyline",
            GeometryFormat::Polyline6 => "polyline6",
        }
    }

    fn precision(self) -> u32 {
        match self {
            GeometryFormat::Polyline6 => 6,
            _ => polyline::DEFAULT_PRECISION,
        }
    }
}

impl fmt::Display for GeometryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

impl FromStr for GeometryFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "geojson" => Ok(GeometryFormat::GeoJson),
            "polyline" => Ok(GeometryFormat::Polyline),
            "polyline6" => Ok(GeometryFormat::Polyline6),
            other => Err(format!("unknown geometry format '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub geometries: GeometryFormat,
    pub timeout_secs: u64,
    /// Assumed speed for straight-line estimates when the engine fails.
    pub fallback_speed_kmh: f64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            geometries: GeometryFormat::GeoJson,
            timeout_secs: 10,
            fallback_speed_kmh: 40.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("at least two waypoints are required, got {0}")]
    TooFewWaypoints(usize),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("routing engine answered HTTP {0}")]
    Status(u16),

    #[error("routing engine returned code {code}: {message}")]
    Engine { code: String, message: String },

    #[error("routing engine returned no route")]
    NoRoute,

    #[error("undecodable route geometry: {0}")]
    Geometry(#[from] PolylineError),
}

/// A road route as returned by the engine, already in (lat, lng) order.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRoute {
    pub path: Polyline,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, waypoints: &[Coordinate]) -> String {
        format!(
            "{}/route/v1/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            coordinate_list(waypoints)
        )
    }
}

/// Renders stops as OSRM's `lng,lat;lng,lat` path segment, keeping their order.
pub fn coordinate_list(waypoints: &[Coordinate]) -> String {
    waypoints
        .iter()
        .map(|point| format!("{},{}", degrees(point.lng), degrees(point.lat)))
        .collect::<Vec<_>>()
        .join(";")
}

fn degrees(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl RoutingEngine for OsrmClient {
    async fn route(&self, waypoints: &[Coordinate]) -> Result<EngineRoute, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::TooFewWaypoints(waypoints.len()));
        }

        let response = self
            .client
            .get(self.route_url(waypoints))
            .query(&[
                ("overview", "full"),
                ("geometries", self.config.geometries.query_value()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status.as_u16()));
        }

        let body = response.json::<OsrmRouteResponse>().await?;
        if body.code != OSRM_OK {
            return Err(RoutingError::Engine {
                code: body.code,
                message: body.message.unwrap_or_default(),
            });
        }

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or(RoutingError::NoRoute)?;

        let path = match route.geometry {
            OsrmGeometry::Encoded(encoded) => {
                polyline::decode(&encoded, self.config.geometries.precision())?
            }
            OsrmGeometry::GeoJson { coordinates } => coordinates
                .into_iter()
                .map(Coordinate::from_lng_lat)
                .collect(),
        };

        Ok(EngineRoute {
            path,
            distance: route.distance,
            duration: route.duration,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: OsrmGeometry,
    distance: f64,
    duration: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OsrmGeometry {
    Encoded(String),
    GeoJson { coordinates: Vec<[f64; 2]> },
}
