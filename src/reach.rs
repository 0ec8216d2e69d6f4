//! Polyline reach-search.
//!
//! Finds the polyline coordinate where a route's cumulative ETA (or distance)
//! first reaches a target. Every ETA evaluation is a routing-service call, so
//! instead of bisecting, each round probes 8 evenly spaced indices with a
//! single multi-waypoint route query: 7 interior points as waypoints and the
//! range's top index as destination. The range shrinks by a factor of ~8 per
//! call rather than 2.

use std::iter;
use std::time::Duration;

use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::location::MapLocation;
use crate::polyline::Polyline;
use crate::traits::DirectionsProvider;

/// Sub-intervals per probe round.
const PARTITIONS: usize = 8;

/// What the search is looking for. At least one budget must be set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachTarget {
    pub time_left: Option<Duration>,
    /// Distance budget in meters.
    pub distance_within: Option<f64>,
}

impl ReachTarget {
    pub fn time(time_left: Duration) -> Self {
        Self {
            time_left: Some(time_left),
            distance_within: None,
        }
    }

    pub fn distance(meters: f64) -> Self {
        Self {
            time_left: None,
            distance_within: Some(meters),
        }
    }

    /// Also stop at the point where `meters` of range run out.
    pub fn or_distance(mut self, meters: f64) -> Self {
        self.distance_within = Some(meters);
        self
    }

    fn classify(&self, eta: Duration, distance: f64, tolerance: &ReachTolerance) -> Reach {
        let time_within = self
            .time_left
            .is_some_and(|t| eta <= t && eta >= t.saturating_sub(tolerance.time));
        let distance_within = self
            .distance_within
            .is_some_and(|d| distance <= d && distance >= d - tolerance.distance);
        if time_within || distance_within {
            return Reach::Within;
        }

        let time_below = self
            .time_left
            .is_none_or(|t| eta < t.saturating_sub(tolerance.time));
        let distance_below = self
            .distance_within
            .is_none_or(|d| distance < d - tolerance.distance);
        if time_below && distance_below {
            Reach::Below
        } else {
            Reach::Above
        }
    }
}

/// Window widths below a target that count as a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachTolerance {
    pub time: Duration,
    /// Meters.
    pub distance: f64,
}

impl From<&PlannerConfig> for ReachTolerance {
    fn from(config: &PlannerConfig) -> Self {
        Self {
            time: config.reach_tolerance(),
            distance: config.reach_distance_tolerance_m,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    Below,
    Within,
    Above,
}

/// Result of a reach-search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReachPoint {
    pub index: usize,
    pub coords: (f64, f64),
    /// Route queries issued.
    pub calls: usize,
}

/// Locate the coordinate on `polyline` matching `target`.
///
/// Cumulative metrics are measured from the first polyline point. If the
/// whole polyline stays below the target, the last point is returned. When
/// no point falls inside the window, the last point below it is returned.
pub fn find_reach_point<D>(
    directions: &D,
    polyline: &Polyline,
    target: &ReachTarget,
    tolerance: &ReachTolerance,
) -> Result<ReachPoint, PlannerError>
where
    D: DirectionsProvider + ?Sized,
{
    if target.time_left.is_none() && target.distance_within.is_none() {
        return Err(PlannerError::InvalidRequest(
            "reach target needs a time or distance budget".to_string(),
        ));
    }
    let points = polyline.points();
    let Some(&first) = points.first() else {
        return Err(PlannerError::InvalidRequest("empty polyline".to_string()));
    };

    let origin = MapLocation::from_coords(first);
    let mut bottom = 0;
    let mut top = points.len() - 1;
    let mut calls = 0;

    while top - bottom > 1 {
        let probes = probe_indices(bottom, top);
        let waypoints: Vec<MapLocation> = probes[..probes.len() - 1]
            .iter()
            .map(|index| MapLocation::from_coords(points[*index]))
            .collect();

        let route = directions.route(&origin, &MapLocation::from_coords(points[top]), &waypoints)?;
        calls += 1;
        if route.checkpoints.len() != waypoints.len() {
            return Err(PlannerError::InvalidRequest(format!(
                "route returned {} checkpoints for {} waypoints",
                route.checkpoints.len(),
                waypoints.len()
            )));
        }

        let metrics = route
            .checkpoints
            .iter()
            .map(|checkpoint| (checkpoint.eta(), checkpoint.distance_from_origin))
            .chain(iter::once((route.eta, route.distance)));

        for (&index, (eta, distance)) in probes.iter().zip(metrics) {
            match target.classify(eta, distance, tolerance) {
                Reach::Within => {
                    debug!(index, calls, ?eta, distance, "reach point found");
                    return Ok(ReachPoint {
                        index,
                        coords: points[index],
                        calls,
                    });
                }
                Reach::Below => bottom = index,
                Reach::Above => {
                    top = index;
                    break;
                }
            }
        }
        debug!(bottom, top, calls, "reach range narrowed");
    }

    Ok(ReachPoint {
        index: bottom,
        coords: points[bottom],
        calls,
    })
}

/// Evenly spaced indices in `(bottom, top]`, ascending, ending with `top`.
fn probe_indices(bottom: usize, top: usize) -> Vec<usize> {
    let span = top - bottom;
    let mut indices: Vec<usize> = (1..=PARTITIONS)
        .map(|step| bottom + span * step / PARTITIONS)
        .filter(|index| *index > bottom)
        .collect();
    indices.dedup();
    indices
}
