//! The planning dashboard: map, notices, point placement and route runs,
//! wired to the configured services.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use thiserror::Error;
use tracing::{error, info};

use crate::backend::{BackendClient, BackendError, Counts, WastePointRecord};
use crate::config::AppConfig;
use crate::entry::{EntryError, PointForm, VehicleForm, WastePointForm};
use crate::haversine::HaversineEstimator;
use crate::map::{Bounds, MapSurface, MarkerIcon, MarkerId, MarkerLayer};
use crate::model::{Coordinate, OptimizationResult, Vehicle, VehicleId, WaypointRole};
use crate::notice::NoticeBoard;
use crate::osrm::OsrmClient;
use crate::pipeline::{FIT_PADDING_PX, RenderHandle, RoutePipeline};
use crate::placement::{PlacementController, PlacementError, PlacementMode, point_popup};
use crate::route::RouteFetcher;
use crate::statistics::{RouteStatistic, route_statistics};
use crate::traits::RoutingEngine;
use crate::vroom::{CollectionProblem, SolverError, VroomClient};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("could not build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Entry(#[from] EntryError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("route optimization failed: {0}")]
    Solver(#[from] SolverError),

    #[error("start and dump points are not set")]
    MissingStartOrDump,

    #[error("no vehicles registered")]
    NoVehicles,

    #[error("no waste points registered")]
    NoWastePoints,
}

pub struct Dashboard<E> {
    surface: Rc<RefCell<MapSurface>>,
    notices: NoticeBoard,
    backend: BackendClient,
    solver: VroomClient,
    placement: PlacementController<BackendClient>,
    pipeline: RoutePipeline<E>,
}

impl Dashboard<OsrmClient> {
    /// Dashboard backed by the OSRM, VROOM and backend services in `config`.
    pub fn connect(config: &AppConfig) -> Result<Self, DashboardError> {
        let engine = OsrmClient::new(config.osrm.clone())?;
        Self::with_engine(config, engine)
    }
}

impl<E: RoutingEngine + 'static> Dashboard<E> {
    pub fn with_engine(config: &AppConfig, engine: E) -> Result<Self, DashboardError> {
        let surface = Rc::new(RefCell::new(MapSurface::mount(&config.map)));
        let backend = BackendClient::new(config.backend.clone())?;
        let solver = VroomClient::new(config.vroom.clone())?;
        let pipeline = RoutePipeline::new(
            RouteFetcher::new(engine)
                .with_estimator(HaversineEstimator::new(config.osrm.fallback_speed_kmh)),
            Rc::clone(&surface),
            config.map.route_start,
        );

        Ok(Self {
            surface,
            notices: NoticeBoard::new(),
            placement: PlacementController::new(backend.clone()),
            backend,
            solver,
            pipeline,
        })
    }

    pub fn surface(&self) -> Ref<'_, MapSurface> {
        self.surface.borrow()
    }

    pub fn notices(&self) -> &NoticeBoard {
        &self.notices
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn placement_mode(&self) -> Option<PlacementMode> {
        self.placement.mode()
    }

    pub fn select_mode(&mut self, mode: PlacementMode) {
        self.placement.select(mode);
    }

    pub async fn click(&mut self, at: Coordinate) -> Result<Option<MarkerId>, PlacementError> {
        self.placement
            .handle_click(&self.surface, &self.notices, at)
            .await
    }

    /// Shows the stored start, dump and waste points and fits the view to
    /// them. Returns how many markers were placed.
    pub async fn load_points(&self) -> Result<usize, DashboardError> {
        let loaded = tokio::try_join!(
            self.backend.start_point(),
            self.backend.dump_point(),
            self.backend.waste_points(),
        );
        let (start, dump, waste_points) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                error!(error = %err, "loading points failed");
                return Err(err.into());
            }
        };

        let mut points = Vec::with_capacity(waste_points.len() + 2);
        let mut surface = self.surface.borrow_mut();

        for (role, record) in [(WaypointRole::Start, start), (WaypointRole::Dump, dump)] {
            if let Some(record) = record {
                let at = record.coordinate();
                surface.add_marker(
                    at,
                    MarkerIcon::for_role(role),
                    point_popup(role, None, at),
                    MarkerLayer::Points,
                );
                points.push(at);
            }
        }
        for record in &waste_points {
            let at = record.coordinate();
            surface.add_marker(
                at,
                MarkerIcon::WastePoint,
                point_popup(WaypointRole::WastePoint, Some(&record.name), at),
                MarkerLayer::Points,
            );
            points.push(at);
        }

        if let Some(bounds) = Bounds::from_points(&points) {
            surface.fit_bounds(bounds, FIT_PADDING_PX);
        }
        Ok(points.len())
    }

    /// Gathers vehicles and points from the backend and asks the solver for
    /// routes. Failures are also posted as error notices.
    pub async fn optimize(&self) -> Result<OptimizationResult, DashboardError> {
        let outcome = self.run_optimization().await;
        self.report(outcome, "Route optimization completed")
    }

    async fn run_optimization(&self) -> Result<OptimizationResult, DashboardError> {
        let (vehicles, waste_points, start, dump) = tokio::try_join!(
            self.backend.vehicles(),
            self.backend.waste_points(),
            self.backend.start_point(),
            self.backend.dump_point(),
        )?;

        let (Some(start), Some(dump)) = (start, dump) else {
            return Err(DashboardError::MissingStartOrDump);
        };
        if vehicles.is_empty() {
            return Err(DashboardError::NoVehicles);
        }
        if waste_points.is_empty() {
            return Err(DashboardError::NoWastePoints);
        }

        let problem = CollectionProblem {
            vehicles: &vehicles,
            waste_points: &waste_points,
            start: start.coordinate(),
            dump: dump.coordinate(),
        };
        let result = self.solver.optimize(&problem).await?;
        info!(routes = result.routes.len(), "optimization result received");
        Ok(result)
    }

    pub async fn add_vehicle(&self, form: &VehicleForm) -> Result<Vehicle, DashboardError> {
        let outcome = async {
            let vehicle = form.validate()?;
            Ok::<_, DashboardError>(self.backend.add_vehicle(&vehicle).await?)
        }
        .await;
        self.report(outcome, "Vehicle added")
    }

    pub async fn delete_vehicle(&self, id: VehicleId) -> Result<(), DashboardError> {
        let outcome = self.backend.delete_vehicle(id).await.map_err(DashboardError::from);
        self.report(outcome, "Vehicle deleted")
    }

    pub async fn add_waste_point(
        &self,
        form: &WastePointForm,
    ) -> Result<WastePointRecord, DashboardError> {
        let outcome = async {
            let waypoint = form.validate()?;
            let name = waypoint.name.as_deref().unwrap_or_default();
            Ok::<_, DashboardError>(self.backend.add_waste_point(name, waypoint.coordinate).await?)
        }
        .await;
        self.report(outcome, "Waste point added")
    }

    pub async fn update_waste_point(
        &self,
        id: i64,
        form: &WastePointForm,
    ) -> Result<WastePointRecord, DashboardError> {
        let outcome = async {
            let waypoint = form.validate()?;
            let name = waypoint.name.as_deref().unwrap_or_default();
            Ok::<_, DashboardError>(self
                .backend
                .update_waste_point(id, name, waypoint.coordinate)
                .await?)
        }
        .await;
        self.report(outcome, "Waste point updated")
    }

    pub async fn delete_waste_point(&self, id: i64) -> Result<(), DashboardError> {
        let outcome = self.backend.delete_waste_point(id).await.map_err(DashboardError::from);
        self.report(outcome, "Waste point deleted")
    }

    pub async fn save_start_point(&self, form: &PointForm) -> Result<Coordinate, DashboardError> {
        self.save_point(WaypointRole::Start, form, "Start point saved")
            .await
    }

    pub async fn save_dump_point(&self, form: &PointForm) -> Result<Coordinate, DashboardError> {
        self.save_point(WaypointRole::Dump, form, "Dump point saved")
            .await
    }

    async fn save_point(
        &self,
        role: WaypointRole,
        form: &PointForm,
        done: &str,
    ) -> Result<Coordinate, DashboardError> {
        let outcome = async {
            let at = form.validate(role)?.coordinate;
            let saved = if role == WaypointRole::Dump {
                self.backend.save_dump_point(at).await?
            } else {
                self.backend.save_start_point(at).await?
            };
            Ok::<_, DashboardError>(saved.coordinate())
        }
        .await;
        self.report(outcome, done)
    }

    /// Totals for the dashboard header. Failures are posted as error notices.
    pub async fn counts(&self) -> Result<Counts, DashboardError> {
        match self.backend.counts().await {
            Ok(counts) => Ok(counts),
            Err(err) => {
                self.notices.error(err.to_string());
                Err(err.into())
            }
        }
    }

    fn report<T>(&self, outcome: Result<T, DashboardError>, done: &str) -> Result<T, DashboardError> {
        match outcome {
            Ok(value) => {
                self.notices.success(done);
                Ok(value)
            }
            Err(err) => {
                self.notices.error(err.to_string());
                Err(err)
            }
        }
    }

    /// Draws `result`, replacing any routes already shown.
    ///
    /// Must run inside a [`tokio::task::LocalSet`].
    pub fn show(&self, result: &OptimizationResult) -> RenderHandle {
        self.pipeline.render(result)
    }

    pub fn statistics(
        &self,
        result: &OptimizationResult,
        vehicles: &[Vehicle],
    ) -> Vec<RouteStatistic> {
        route_statistics(&result.routes, vehicles)
    }
}
