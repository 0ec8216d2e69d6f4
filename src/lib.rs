//! haul-planner core
//!
//! Plans truck routes that respect driving-time regulations and fuel range,
//! inserting rest or fuel stops where needed.

pub mod config;
pub mod error;
pub mod haversine;
pub mod location;
pub mod osrm;
pub mod planner;
pub mod polyline;
pub mod reach;
pub mod route;
pub mod stops;
pub mod traits;
pub mod watcher;
