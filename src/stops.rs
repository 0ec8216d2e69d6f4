//! Stop selection: the optimized-route search that inserts a mandatory stop,
//! and the calculators that offer alternative stops.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::location::{MapLocation, RouteLocation};
use crate::reach::{ReachTarget, ReachTolerance, find_reach_point};
use crate::route::Route;
use crate::traits::{DirectionsProvider, PlacesProvider};

/// Address given to a stop synthesized where no point of interest exists.
pub const FORCED_STOP_ADDRESS: &str = "Forced stop";

/// Which kind of point of interest to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopKind {
    Rest,
    Gas,
}

/// A route with one stop inserted ahead of the trip's checkpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizedRoute {
    pub route: Route,
    /// The inserted stop, carrying its ETA on `route`.
    pub stop: MapLocation,
}

/// Borrowed collaborators for one stop search.
pub struct StopSearch<'a, D: ?Sized, P: ?Sized> {
    pub directions: &'a D,
    pub places: &'a P,
    pub config: &'a PlannerConfig,
    /// Where the vehicle is now; all ETAs are measured from here.
    pub from: &'a MapLocation,
}

impl<D, P> StopSearch<'_, D, P>
where
    D: DirectionsProvider + ?Sized,
    P: PlacesProvider + ?Sized,
{
    /// Insert the best stop near `target` on `direct`.
    ///
    /// Candidates come from the places provider in ranked order; at most
    /// `max_candidates` are routed. A candidate is feasible when its ETA on
    /// the recomputed route does not exceed `budget`. Among feasible ones the
    /// shortest total ETA wins, earlier candidates winning ties.
    pub fn optimized_route(
        &self,
        direct: &Route,
        destination: &MapLocation,
        checkpoints: &[MapLocation],
        target: ReachTarget,
        kind: StopKind,
        budget: Duration,
    ) -> Result<OptimizedRoute, PlannerError> {
        let tolerance = ReachTolerance::from(self.config);
        let reach = find_reach_point(self.directions, direct.search_polyline(), &target, &tolerance)?;

        let mut candidates = self.nearby(kind, reach.coords)?;
        if candidates.is_empty() {
            warn!(?kind, coords = ?reach.coords, "no stops nearby, forcing stop on route");
            candidates.push(MapLocation::from_coords(reach.coords).with_address(FORCED_STOP_ADDRESS));
        }

        let mut best: Option<OptimizedRoute> = None;
        for candidate in candidates.into_iter().take(self.config.max_candidates) {
            let waypoints = with_leading_stop(&candidate, checkpoints);
            let route = self.directions.route(self.from, destination, &waypoints)?;
            let eta_to_stop = route.eta_to_first_checkpoint();
            if eta_to_stop > budget {
                debug!(coords = ?candidate.coords(), ?eta_to_stop, ?budget, "candidate exceeds budget");
                continue;
            }
            if best.as_ref().is_none_or(|current| route.eta < current.route.eta) {
                best = Some(OptimizedRoute {
                    stop: candidate.with_eta(eta_to_stop),
                    route,
                });
            }
        }

        match best {
            Some(optimized) => {
                info!(
                    coords = ?optimized.stop.coords(),
                    eta = ?optimized.route.eta,
                    "stop inserted"
                );
                Ok(optimized)
            }
            None => Err(PlannerError::NoFeasibleStop(format!(
                "no {kind:?} stop reachable within {}s",
                budget.as_secs()
            ))),
        }
    }

    /// One alternative stop per reachable horizon.
    ///
    /// For each horizon the first point of interest (in provider order) whose
    /// ETA fits the budget is kept and resolved into a
    /// [`RouteLocation`]. A horizon's own time target widens the budget, so
    /// short-horizon stops stay on offer when the session is exhausted.
    pub fn alternative_stops(
        &self,
        direct: &Route,
        horizons: &[ReachTarget],
        kind: StopKind,
        budget: Duration,
    ) -> Result<Vec<RouteLocation>, PlannerError> {
        let tolerance = ReachTolerance::from(self.config);
        let mut stops: Vec<RouteLocation> = Vec::new();

        for target in horizons {
            let reach = find_reach_point(self.directions, direct.search_polyline(), target, &tolerance)?;
            let horizon_budget = target.time_left.map_or(budget, |time| time.max(budget));

            let Some(stop) = self.first_within(kind, reach.coords, horizon_budget)? else {
                debug!(?target, "no alternative stop for horizon");
                continue;
            };
            if stops.iter().any(|known| known.location == stop) {
                continue;
            }

            let route = self.directions.route(self.from, &stop, &[])?;
            stops.push(RouteLocation {
                location: stop.with_eta(route.eta),
                distance_from_origin: route.distance,
                arrival: route.destination.arrival,
            });
        }

        Ok(stops)
    }

    fn first_within(
        &self,
        kind: StopKind,
        at: (f64, f64),
        budget: Duration,
    ) -> Result<Option<MapLocation>, PlannerError> {
        for poi in self.nearby(kind, at)? {
            if self.directions.eta(self.from, &poi)? <= budget {
                return Ok(Some(poi));
            }
        }
        Ok(None)
    }

    fn nearby(&self, kind: StopKind, at: (f64, f64)) -> Result<Vec<MapLocation>, PlannerError> {
        let found = match kind {
            StopKind::Rest => self.places.nearby_rest_locations(at)?,
            StopKind::Gas => self.places.nearby_gas_stations(at)?,
        };
        Ok(found)
    }
}

/// Waypoints with `stop` first, followed by every checkpoint not at the
/// stop's coordinates.
pub fn with_leading_stop(stop: &MapLocation, checkpoints: &[MapLocation]) -> Vec<MapLocation> {
    let mut waypoints = Vec::with_capacity(checkpoints.len() + 1);
    waypoints.push(stop.clone());
    waypoints.extend(
        checkpoints
            .iter()
            .filter(|checkpoint| !checkpoint.same_coordinates(stop))
            .cloned(),
    );
    waypoints
}
