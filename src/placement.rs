//! Placing start, dump and waste points by clicking the map.

use std::cell::RefCell;

use thiserror::Error;
use tracing::debug;

use crate::backend::BackendError;
use crate::map::{MapSurface, MarkerIcon, MarkerId, MarkerLayer, PopupContent};
use crate::model::{Coordinate, CoordinateError, WaypointRole};
use crate::notice::NoticeBoard;
use crate::traits::PointStore;

/// Name given to waste points created from a map click.
pub const DEFAULT_WASTE_POINT_NAME: &str = "Waste point";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementMode {
    Start,
    Dump,
    WastePoint,
}

impl PlacementMode {
    pub fn role(self) -> WaypointRole {
        match self {
            PlacementMode::Start => WaypointRole::Start,
            PlacementMode::Dump => WaypointRole::Dump,
            PlacementMode::WastePoint => WaypointRole::WastePoint,
        }
    }

    /// Start and dump are single points; the mode ends after one placement.
    fn is_one_shot(self) -> bool {
        !matches!(self, PlacementMode::WastePoint)
    }
}

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),

    #[error(transparent)]
    Persist(#[from] BackendError),
}

/// Popup shown on a placed point marker.
pub fn point_popup(role: WaypointRole, name: Option<&str>, at: Coordinate) -> PopupContent {
    match role {
        WaypointRole::Start => PopupContent::new("Start point"),
        WaypointRole::Dump => PopupContent::new("Dump point"),
        WaypointRole::WastePoint => {
            PopupContent::new(name.unwrap_or(DEFAULT_WASTE_POINT_NAME))
                .line(format!("Coordinates: {}", at))
        }
    }
}

pub struct PlacementController<S> {
    store: S,
    mode: Option<PlacementMode>,
}

impl<S: PointStore> PlacementController<S> {
    pub fn new(store: S) -> Self {
        Self { store, mode: None }
    }

    pub fn mode(&self) -> Option<PlacementMode> {
        self.mode
    }

    /// Activates `mode`, or deactivates it if it is already active.
    pub fn select(&mut self, mode: PlacementMode) {
        self.mode = if self.mode == Some(mode) {
            None
        } else {
            Some(mode)
        };
    }

    /// Persists a clicked point for the active mode and marks it on the map.
    ///
    /// Returns `Ok(None)` when no mode is active. The marker is only added
    /// once the backend has stored the point; any failure becomes an error
    /// notice and leaves the map untouched.
    pub async fn handle_click(
        &mut self,
        surface: &RefCell<MapSurface>,
        notices: &NoticeBoard,
        at: Coordinate,
    ) -> Result<Option<MarkerId>, PlacementError> {
        let Some(mode) = self.mode else {
            return Ok(None);
        };

        if let Err(err) = at.validate() {
            notices.error(format!("Invalid coordinates: {}", err));
            return Err(err.into());
        }

        let name = match mode {
            PlacementMode::Start => self.store.save_start_point(at).await.map(|_| None),
            PlacementMode::Dump => self.store.save_dump_point(at).await.map(|_| None),
            PlacementMode::WastePoint => self
                .store
                .add_waste_point(DEFAULT_WASTE_POINT_NAME, at)
                .await
                .map(|record| Some(record.name)),
        };

        let name = match name {
            Ok(name) => name,
            Err(err) => {
                notices.error(err.to_string());
                return Err(err.into());
            }
        };

        let role = mode.role();
        let marker = surface.borrow_mut().add_marker(
            at,
            MarkerIcon::for_role(role),
            point_popup(role, name.as_deref(), at),
            MarkerLayer::Points,
        );
        debug!(?mode, %at, "point placed");

        if mode.is_one_shot() {
            self.mode = None;
        }
        Ok(Some(marker))
    }
}
