//! Route rendering: one optimization result in, colored route overlays and
//! numbered stop markers out.
//!
//! Each vehicle's geometry request runs as its own local task, so vehicles
//! resolve in any order. Stop numbers are handed out before any request is
//! issued and follow vehicle-then-step order. A newer result bumps the
//! generation, and completions from older generations are dropped without
//! touching the map.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use jiff::SignedDuration;
use jiff::civil::Time;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::map::{MapSurface, MarkerIcon, MarkerLayer, PopupContent};
use crate::model::{OptimizationResult, StepKind, VehicleId, VehicleRoute};
use crate::route::RouteFetcher;
use crate::traits::RoutingEngine;

pub const PALETTE: [&str; 10] = [
    "#FF3B30", "#34C759", "#007AFF", "#FF9500", "#AF52DE", "#5856D6", "#FF2D55", "#5AC8FA",
    "#FFCC00", "#4CD964",
];

/// Padding, in pixels, kept around routes when fitting the view.
pub const FIT_PADDING_PX: u32 = 50;

/// Color for the vehicle at `index` in the result; cycles through [`PALETTE`].
pub fn route_color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Formats an arrival offset as a wall-clock time after `route_start`.
pub fn arrival_label(route_start: Time, arrival_secs: i64) -> String {
    route_start
        .wrapping_add(SignedDuration::from_secs(arrival_secs))
        .strftime("%H:%M:%S")
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleOutcome {
    /// Road geometry drawn.
    Rendered,
    /// Engine failed; straight dashed line drawn.
    Fallback,
    /// A newer result arrived first; nothing drawn.
    Stale,
    /// The vehicle's task died; nothing drawn.
    Failed(String),
}

#[derive(Debug)]
pub struct RenderReport {
    pub generation: u64,
    pub stops: u32,
    pub outcomes: Vec<(VehicleId, VehicleOutcome)>,
    /// Vehicles whose route had fewer than two steps.
    pub skipped: Vec<VehicleId>,
}

impl RenderReport {
    pub fn count(&self, outcome: &VehicleOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| o == outcome).count()
    }

    pub fn outcome(&self, vehicle_id: VehicleId) -> Option<&VehicleOutcome> {
        self.outcomes
            .iter()
            .find(|(id, _)| *id == vehicle_id)
            .map(|(_, outcome)| outcome)
    }
}

/// In-flight rendering of one result. Dropping it does not cancel anything.
#[must_use = "await `finish` to learn how each vehicle resolved"]
pub struct RenderHandle {
    generation: u64,
    stops: u32,
    tasks: Vec<(VehicleId, JoinHandle<VehicleOutcome>)>,
    skipped: Vec<VehicleId>,
}

impl RenderHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Waits for every vehicle. A failing vehicle is logged and reported,
    /// never propagated.
    pub async fn finish(self) -> RenderReport {
        let mut outcomes = Vec::with_capacity(self.tasks.len());
        for (vehicle_id, task) in self.tasks {
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    error!(vehicle_id, error = %err, "route rendering task failed");
                    VehicleOutcome::Failed(err.to_string())
                }
            };
            outcomes.push((vehicle_id, outcome));
        }

        RenderReport {
            generation: self.generation,
            stops: self.stops,
            outcomes,
            skipped: self.skipped,
        }
    }
}

pub struct RoutePipeline<E> {
    fetcher: Rc<RouteFetcher<E>>,
    surface: Rc<RefCell<MapSurface>>,
    generation: Rc<Cell<u64>>,
    route_start: Time,
}

impl<E: RoutingEngine + 'static> RoutePipeline<E> {
    pub fn new(fetcher: RouteFetcher<E>, surface: Rc<RefCell<MapSurface>>, route_start: Time) -> Self {
        Self {
            fetcher: Rc::new(fetcher),
            surface,
            generation: Rc::new(Cell::new(0)),
            route_start,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Replaces whatever routes are on the map with those of `result`.
    ///
    /// Must run inside a [`tokio::task::LocalSet`]; per-vehicle work is
    /// spawned with `spawn_local` and not awaited here.
    pub fn render(&self, result: &OptimizationResult) -> RenderHandle {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        {
            let mut surface = self.surface.borrow_mut();
            let overlays = surface.remove_all_overlays();
            let stops = surface.remove_all_markers(MarkerLayer::Stops);
            debug!(generation, overlays, stops, "cleared previous routes");
        }

        let mut next_stop = 1u32;
        let mut tasks = Vec::with_capacity(result.routes.len());
        let mut skipped = Vec::new();

        for (index, route) in result.routes.iter().enumerate() {
            if route.steps.len() < 2 {
                debug!(vehicle_id = route.vehicle_id, "route has nothing to draw");
                skipped.push(route.vehicle_id);
                continue;
            }

            let color = route_color(index);
            self.place_stop_markers(route, color, &mut next_stop);

            let vehicle_id = route.vehicle_id;
            let waypoints = route.coordinates();
            let popup = PopupContent::new(format!("Vehicle {}", vehicle_id))
                .line(format!("Duration: {} min", (route.duration / 60.0).round() as i64))
                .line(format!("Stops: {}", route.job_count()));

            let fetcher = Rc::clone(&self.fetcher);
            let surface = Rc::clone(&self.surface);
            let current = Rc::clone(&self.generation);

            let task = tokio::task::spawn_local(async move {
                let rendered = fetcher.fetch(&waypoints, color).await;

                if current.get() != generation {
                    debug!(vehicle_id, generation, "discarding route from superseded result");
                    return VehicleOutcome::Stale;
                }

                let outcome = if rendered.is_fallback() {
                    VehicleOutcome::Fallback
                } else {
                    VehicleOutcome::Rendered
                };

                let popup = popup.lines(rendered.summary.lines());
                let mut surface = surface.borrow_mut();
                surface.add_overlay(Some(vehicle_id), rendered, popup);
                if let Some(bounds) = surface.overlay_bounds() {
                    surface.fit_bounds(bounds, FIT_PADDING_PX);
                }
                outcome
            });
            tasks.push((vehicle_id, task));
        }

        RenderHandle {
            generation,
            stops: next_stop - 1,
            tasks,
            skipped,
        }
    }

    fn place_stop_markers(&self, route: &VehicleRoute, color: &str, next_stop: &mut u32) {
        let mut surface = self.surface.borrow_mut();
        for step in route.steps.iter().filter(|step| step.kind == StepKind::Job) {
            let number = *next_stop;
            *next_stop += 1;

            let popup = PopupContent::new(format!("Stop {}", number))
                .line(format!("Vehicle: {}", route.vehicle_id))
                .line(format!(
                    "Arrival: {}",
                    arrival_label(self.route_start, step.arrival)
                ));
            surface.add_marker(
                step.location,
                MarkerIcon::StopNumber {
                    number,
                    color: color.to_string(),
                },
                popup,
                MarkerLayer::Stops,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_cycles() {
        assert_eq!(route_color(0), "#FF3B30");
        assert_eq!(route_color(9), "#4CD964");
        assert_eq!(route_color(10), "#FF3B30");
        assert_eq!(route_color(12), route_color(2));
    }

    #[test]
    fn test_arrival_label() {
        let start = jiff::civil::time(8, 0, 0, 0);
        assert_eq!(arrival_label(start, 0), "08:00:00");
        assert_eq!(arrival_label(start, 3_725), "09:02:05");
        // Offsets past midnight wrap onto the next day's clock.
        assert_eq!(arrival_label(start, 16 * 3600 + 60), "00:01:00");
    }
}
