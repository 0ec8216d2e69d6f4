//! Collaborator interfaces consumed by the trip planner.
//!
//! Routing, places lookup, regulation arithmetic and fuel telemetry live
//! outside this crate. Apps implement these traits over their own services.

use std::sync::mpsc::Sender;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::ProviderError;
use crate::location::MapLocation;
use crate::route::Route;

/// Answers route and ETA queries against a mapping service.
pub trait DirectionsProvider {
    /// Route from `origin` through `waypoints` (in order) to `destination`.
    ///
    /// The returned route has exactly one checkpoint per waypoint.
    fn route(
        &self,
        origin: &MapLocation,
        destination: &MapLocation,
        waypoints: &[MapLocation],
    ) -> Result<Route, ProviderError>;

    /// Travel time from `from` to `to`.
    fn eta(&self, from: &MapLocation, to: &MapLocation) -> Result<Duration, ProviderError>;
}

/// Answers nearby point-of-interest queries. Results are provider-ranked.
pub trait PlacesProvider {
    fn nearby_rest_locations(&self, at: (f64, f64)) -> Result<Vec<MapLocation>, ProviderError>;

    fn nearby_gas_stations(&self, at: (f64, f64)) -> Result<Vec<MapLocation>, ProviderError>;
}

/// Remaining legal driving time, derived from driver history.
pub trait RegulationHandler {
    type History;

    fn session_time_left(&self, history: &Self::History) -> TimeLeft;

    fn day_time_left(&self, history: &Self::History) -> TimeLeft;
}

/// Exposes the vehicle's remaining range.
pub trait FuelTankInfo {
    /// Remaining range in fuel-gauge units; see
    /// [`PlannerConfig::distance_per_unit_m`](crate::config::PlannerConfig).
    fn mileage(&self) -> f64;
}

/// Receives a notification after every successful recompute.
pub trait RouteListener {
    fn route_changed(&self, event: &RouteChanged);
}

/// Durations until a regulatory violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeLeft {
    pub time_left: Duration,
    pub extended_time_left: Duration,
}

impl TimeLeft {
    pub fn new(time_left: Duration, extended_time_left: Duration) -> Self {
        Self {
            time_left,
            extended_time_left,
        }
    }
}

/// Published once per successful recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChanged {
    pub computed_at: DateTime<Utc>,
}

/// Listener that drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopListener;

impl RouteListener for NoopListener {
    fn route_changed(&self, _event: &RouteChanged) {}
}

impl RouteListener for Sender<RouteChanged> {
    fn route_changed(&self, event: &RouteChanged) {
        if self.send(event.clone()).is_err() {
            warn!("route listener disconnected, notification dropped");
        }
    }
}
