//! Route query results and the planner's published snapshot.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::location::{MapLocation, RouteLocation};
use crate::polyline::Polyline;

/// A route returned by a [`DirectionsProvider`](crate::traits::DirectionsProvider).
///
/// `checkpoints` holds one entry per requested waypoint, in request order,
/// each carrying cumulative ETA and distance from the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub checkpoints: Vec<RouteLocation>,
    pub destination: RouteLocation,
    pub overview_polyline: Polyline,
    pub detailed_polyline: Polyline,
    pub eta: Duration,
    /// Total distance in meters.
    pub distance: f64,
}

impl Route {
    /// The first waypoint, or the destination when the route has none.
    pub fn first_checkpoint(&self) -> &RouteLocation {
        self.checkpoints.first().unwrap_or(&self.destination)
    }

    pub fn eta_to_first_checkpoint(&self) -> Duration {
        self.first_checkpoint().eta()
    }

    pub fn distance_to_first_checkpoint(&self) -> f64 {
        self.first_checkpoint().distance_from_origin
    }

    /// Geometry used for reach-searches: detailed when available.
    pub fn search_polyline(&self) -> &Polyline {
        if self.detailed_polyline.is_empty() {
            &self.overview_polyline
        } else {
            &self.detailed_polyline
        }
    }
}

/// Snapshot of the current plan handed to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedRoute {
    pub active_route: Route,
    /// The chosen stop, the inserted stop, or the destination.
    pub recommended_stop: MapLocation,
    pub alternative_stops: Vec<RouteLocation>,
}

impl PlannedRoute {
    /// Where the vehicle is headed next.
    pub fn next_destination(&self) -> &RouteLocation {
        self.active_route.first_checkpoint()
    }

    /// Count stop ETAs down between recomputes.
    pub fn elapse(&mut self, elapsed: Duration) {
        self.recommended_stop.elapse(elapsed);
        for stop in &mut self.alternative_stops {
            stop.location.elapse(elapsed);
        }
    }
}
