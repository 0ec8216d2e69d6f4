//! Detects when the vehicle has passed the next checkpoint.
//!
//! A checkpoint counts as passed once the vehicle has come within the
//! radius and then left it again. The caller then reports it with
//! [`TripPlanner::passed_checkpoint`](crate::planner::TripPlanner::passed_checkpoint)
//! and re-plans with `update_route`.

use crate::haversine::HaversineDirections;
use crate::location::MapLocation;

const DEFAULT_RADIUS_M: f64 = 200.0;

#[derive(Debug, Clone)]
pub struct CheckpointWatcher {
    radius_m: f64,
    inside: bool,
}

impl Default for CheckpointWatcher {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS_M)
    }
}

impl CheckpointWatcher {
    pub fn new(radius_m: f64) -> Self {
        Self {
            radius_m,
            inside: false,
        }
    }

    /// Feed a position fix. Returns the checkpoint once it has been passed.
    pub fn observe(&mut self, position: &MapLocation, next_checkpoint: &MapLocation) -> Option<MapLocation> {
        let meters = HaversineDirections::haversine_km(position.coords(), next_checkpoint.coords()) * 1000.0;

        if !self.inside {
            self.inside = meters < self.radius_m;
            None
        } else if meters > self.radius_m {
            self.inside = false;
            Some(next_checkpoint.clone())
        } else {
            None
        }
    }

    /// Forget a pending approach, e.g. after the route changed.
    pub fn reset(&mut self) {
        self.inside = false;
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }
}
