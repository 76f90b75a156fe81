//! collection-planner core
//!
//! Waste-collection route planning: points are placed and persisted, routes
//! are optimized by an external solver, and the result is drawn on a map
//! surface with road geometry from an external routing engine.

pub mod backend;
pub mod config;
pub mod dashboard;
pub mod entry;
pub mod haversine;
pub mod map;
pub mod model;
pub mod notice;
pub mod osrm;
pub mod pipeline;
pub mod placement;
pub mod polyline;
pub mod route;
pub mod statistics;
pub mod traits;
pub mod vroom;
