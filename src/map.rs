//! The map surface: viewport, base tiles, and every overlay and marker drawn
//! on top of them.
//!
//! All drawing goes through [`MapSurface`]. It hands out ids for what it
//! stores and can export its full state as a GeoJSON feature collection for
//! a browser renderer.

use std::f64::consts::PI;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;

use crate::model::{Coordinate, VehicleId, WaypointRole};
use crate::route::RenderedRoute;

const TILE_SIZE_PX: f64 = 256.0;

#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub tile_url: String,
    pub attribution: String,
    pub center: Coordinate,
    pub zoom: u8,
    pub max_zoom: u8,
    /// Width and height of the rendered map in pixels, used when fitting bounds.
    pub viewport_px: (u32, u32),
    /// Wall-clock time at which routes start; arrival offsets are added to it.
    pub route_start: jiff::civil::Time,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; OpenStreetMap contributors".to_string(),
            center: Coordinate::new(41.0082, 28.9784),
            zoom: 13,
            max_zoom: 18,
            viewport_px: (1024, 768),
            route_start: jiff::civil::time(8, 0, 0, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OverlayId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerId(u64);

/// Popup text as data; the surface decides how to mark it up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopupContent {
    pub title: String,
    pub lines: Vec<String>,
}

impl PopupContent {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn lines<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "icon", rename_all = "snake_case")]
pub enum MarkerIcon {
    Start,
    Dump,
    WastePoint,
    StopNumber { number: u32, color: String },
}

impl MarkerIcon {
    pub fn for_role(role: WaypointRole) -> Self {
        match role {
            WaypointRole::Start => MarkerIcon::Start,
            WaypointRole::Dump => MarkerIcon::Dump,
            WaypointRole::WastePoint => MarkerIcon::WastePoint,
        }
    }
}

/// Markers are cleared per layer: placed points survive a new route result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerLayer {
    Points,
    Stops,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub position: Coordinate,
    pub icon: MarkerIcon,
    pub popup: PopupContent,
    pub layer: MarkerLayer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub id: OverlayId,
    pub vehicle_id: Option<VehicleId>,
    pub route: RenderedRoute,
    pub popup: PopupContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl Bounds {
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bounds = Bounds {
            south_west: first,
            north_east: first,
        };
        for point in iter {
            bounds.extend(*point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: Coordinate) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lng..=self.north_east.lng).contains(&point.lng)
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: u8,
    /// Last bounds the view was fitted to, with the padding used.
    pub fitted: Option<(Bounds, u32)>,
    /// How many times the view has been re-fitted since mounting.
    pub fit_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
}

#[derive(Debug)]
pub struct MapSurface {
    tiles: TileLayer,
    viewport: Viewport,
    viewport_px: (u32, u32),
    max_zoom: u8,
    overlays: Vec<Overlay>,
    markers: Vec<Marker>,
    next_id: u64,
}

impl MapSurface {
    /// Creates the view with its base layer. Done once per view.
    pub fn mount(config: &MapConfig) -> Self {
        Self {
            tiles: TileLayer {
                url_template: config.tile_url.clone(),
                attribution: config.attribution.clone(),
            },
            viewport: Viewport {
                center: config.center,
                zoom: config.zoom.min(config.max_zoom),
                fitted: None,
                fit_count: 0,
            },
            viewport_px: config.viewport_px,
            max_zoom: config.max_zoom,
            overlays: Vec::new(),
            markers: Vec::new(),
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn tiles(&self) -> &TileLayer {
        &self.tiles
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn markers_in(&self, layer: MarkerLayer) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(move |marker| marker.layer == layer)
    }

    pub fn add_overlay(
        &mut self,
        vehicle_id: Option<VehicleId>,
        route: RenderedRoute,
        popup: PopupContent,
    ) -> OverlayId {
        let id = OverlayId(self.next_id());
        self.overlays.push(Overlay {
            id,
            vehicle_id,
            route,
            popup,
        });
        id
    }

    /// Drops every overlay. Returns how many were removed.
    pub fn remove_all_overlays(&mut self) -> usize {
        let removed = self.overlays.len();
        self.overlays.clear();
        removed
    }

    pub fn add_marker(
        &mut self,
        position: Coordinate,
        icon: MarkerIcon,
        popup: PopupContent,
        layer: MarkerLayer,
    ) -> MarkerId {
        let id = MarkerId(self.next_id());
        self.markers.push(Marker {
            id,
            position,
            icon,
            popup,
            layer,
        });
        id
    }

    /// Drops every marker in `layer`. Returns how many were removed.
    pub fn remove_all_markers(&mut self, layer: MarkerLayer) -> usize {
        let before = self.markers.len();
        self.markers.retain(|marker| marker.layer != layer);
        before - self.markers.len()
    }

    /// Bounding box of every overlay path currently on the map.
    pub fn overlay_bounds(&self) -> Option<Bounds> {
        Bounds::from_points(
            self.overlays
                .iter()
                .flat_map(|overlay| overlay.route.path.points()),
        )
    }

    pub fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32) {
        self.viewport.center = bounds.center();
        self.viewport.zoom = fit_zoom(&bounds, self.viewport_px, padding_px, self.max_zoom);
        self.viewport.fitted = Some((bounds, padding_px));
        self.viewport.fit_count += 1;
    }

    /// Exports overlays and markers as GeoJSON, with tiles and viewport as
    /// foreign members of the collection.
    pub fn snapshot(&self) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.overlays.len() + self.markers.len());

        for overlay in &self.overlays {
            let line = overlay
                .route
                .path
                .points()
                .iter()
                .map(|point| point.to_lng_lat().to_vec())
                .collect();
            features.push(feature(
                Value::LineString(line),
                json!({
                    "kind": "route",
                    "id": overlay.id,
                    "vehicle_id": overlay.vehicle_id,
                    "color": overlay.route.color,
                    "weight": overlay.route.style.weight,
                    "opacity": overlay.route.style.opacity,
                    "dash_array": overlay.route.style.dash_array,
                    "summary": overlay.route.summary.to_string(),
                    "popup": render_popup(&overlay.popup),
                }),
            ));
        }

        for marker in &self.markers {
            let mut properties = json!({
                "kind": "marker",
                "id": marker.id,
                "layer": marker.layer,
                "popup": render_popup(&marker.popup),
            });
            if let (Some(target), Some(icon)) = (
                properties.as_object_mut(),
                object(json!(marker.icon)),
            ) {
                target.extend(icon);
            }
            features.push(feature(
                Value::Point(marker.position.to_lng_lat().to_vec()),
                properties,
            ));
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: object(json!({
                "tiles": self.tiles,
                "viewport": {
                    "center": self.viewport.center.to_lng_lat(),
                    "zoom": self.viewport.zoom,
                },
            })),
        }
    }
}

fn feature(value: Value, properties: serde_json::Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: object(properties),
        foreign_members: None,
    }
}

fn object(value: serde_json::Value) -> Option<JsonObject> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Renders a popup as escaped HTML: bold title, then one line each.
pub fn render_popup(popup: &PopupContent) -> String {
    let mut html = format!("<strong>{}</strong>", escape_html(&popup.title));
    for line in &popup.lines {
        html.push_str("<br>");
        html.push_str(&escape_html(line));
    }
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn mercator_y(lat: f64) -> f64 {
    let clamped = lat.clamp(-85.051_128, 85.051_128).to_radians();
    (PI / 4.0 + clamped / 2.0).tan().ln()
}

/// Largest web-mercator zoom at which `bounds` fits inside the padded view.
fn fit_zoom(bounds: &Bounds, viewport_px: (u32, u32), padding_px: u32, max_zoom: u8) -> u8 {
    let usable_w = f64::from(viewport_px.0.saturating_sub(2 * padding_px).max(1));
    let usable_h = f64::from(viewport_px.1.saturating_sub(2 * padding_px).max(1));

    let lng_span = (bounds.north_east.lng - bounds.south_west.lng).abs();
    let y_span = (mercator_y(bounds.north_east.lat) - mercator_y(bounds.south_west.lat)).abs();
    if lng_span < 1e-9 && y_span < 1e-9 {
        return max_zoom;
    }

    let zoom_x = (usable_w * 360.0 / (TILE_SIZE_PX * lng_span.max(1e-9))).log2();
    let zoom_y = (usable_h * 2.0 * PI / (TILE_SIZE_PX * y_span.max(1e-9))).log2();
    zoom_x.min(zoom_y).floor().clamp(0.0, f64::from(max_zoom)) as u8
}
