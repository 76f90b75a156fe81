//! Turns an ordered stop list into something drawable on the map.
//!
//! [`RouteFetcher::fetch`] never fails: when the routing engine cannot give a
//! road route the stops are joined by a dashed straight line instead.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use crate::haversine::HaversineEstimator;
use crate::model::Coordinate;
use crate::polyline::Polyline;
use crate::traits::RoutingEngine;

const SOLID_WEIGHT: u32 = 5;
const FALLBACK_WEIGHT: u32 = 3;
const FALLBACK_OPACITY: f64 = 0.8;
const FALLBACK_DASH: &str = "5, 10";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub weight: u32,
    pub opacity: f64,
    pub dash_array: Option<String>,
}

impl LineStyle {
    pub fn solid() -> Self {
        Self {
            weight: SOLID_WEIGHT,
            opacity: 1.0,
            dash_array: None,
        }
    }

    pub fn dashed() -> Self {
        Self {
            weight: FALLBACK_WEIGHT,
            opacity: FALLBACK_OPACITY,
            dash_array: Some(FALLBACK_DASH.to_string()),
        }
    }

    pub fn is_dashed(&self) -> bool {
        self.dash_array.is_some()
    }
}

/// Distance and duration of a drawn route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteSummary {
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    /// Straight-line estimate rather than a road measurement.
    pub estimated: bool,
}

impl RouteSummary {
    pub fn distance_label(&self) -> String {
        format!("{:.1} km", self.distance / 1000.0)
    }

    pub fn duration_label(&self) -> String {
        format!("{} min", (self.duration / 60.0).round() as i64)
    }

    pub fn lines(&self) -> Vec<String> {
        let prefix = if self.estimated { "~" } else { "" };
        vec![
            format!("Distance: {}{}", prefix, self.distance_label()),
            format!("Drive time: {}{}", prefix, self.duration_label()),
        ]
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.distance_label(), self.duration_label())?;
        if self.estimated {
            f.write_str(" (straight line)")?;
        }
        Ok(())
    }
}

/// A route ready to hand to the map surface. Lives for one rendering cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedRoute {
    pub color: String,
    pub path: Polyline,
    pub style: LineStyle,
    pub summary: RouteSummary,
}

impl RenderedRoute {
    pub fn is_fallback(&self) -> bool {
        self.style.is_dashed()
    }
}

pub struct RouteFetcher<E> {
    engine: E,
    estimator: HaversineEstimator,
}

impl<E: RoutingEngine> RouteFetcher<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            estimator: HaversineEstimator::default(),
        }
    }

    pub fn with_estimator(mut self, estimator: HaversineEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Requests a road route through `waypoints` in the given order.
    pub async fn fetch(&self, waypoints: &[Coordinate], color: &str) -> RenderedRoute {
        match self.engine.route(waypoints).await {
            Ok(route) => RenderedRoute {
                color: color.to_string(),
                path: route.path,
                style: LineStyle::solid(),
                summary: RouteSummary {
                    distance: route.distance,
                    duration: route.duration,
                    estimated: false,
                },
            },
            Err(err) => {
                warn!(
                    error = %err,
                    stops = waypoints.len(),
                    "routing engine failed, drawing straight line"
                );
                self.straight_line(waypoints, color)
            }
        }
    }

    fn straight_line(&self, waypoints: &[Coordinate], color: &str) -> RenderedRoute {
        let (distance, duration) = self.estimator.estimate(waypoints);
        RenderedRoute {
            color: color.to_string(),
            path: Polyline::new(waypoints.to_vec()),
            style: LineStyle::dashed(),
            summary: RouteSummary {
                distance,
                duration,
                estimated: true,
            },
        }
    }
}
