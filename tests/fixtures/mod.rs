//! Test fixtures for collection-planner.
//!
//! Provides:
//! - Istanbul locations usable as depot, dump and waste points
//! - Builders for solver routes and optimization results

pub mod istanbul_locations;

pub use istanbul_locations::*;
