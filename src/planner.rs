//! Trip planner: owns the trip and decides where mandatory stops go.
//!
//! Every mutating operation recomputes the plan from scratch against the
//! collaborators and swaps it in only when the whole computation succeeded.
//! Readers get clones through [`TripPlanner::get_route`].

use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::PlannerConfig;
use crate::error::PlannerError;
use crate::location::{MapLocation, RouteLocation};
use crate::reach::ReachTarget;
use crate::route::{PlannedRoute, Route};
use crate::stops::{StopKind, StopSearch, with_leading_stop};
use crate::traits::{
    DirectionsProvider, FuelTankInfo, NoopListener, PlacesProvider, RegulationHandler, RouteChanged,
    RouteListener,
};

/// Trip session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub start: MapLocation,
    /// `None` once the destination has been passed.
    pub final_destination: Option<MapLocation>,
    /// Ordered, no duplicate coordinates.
    pub checkpoints: Vec<MapLocation>,
    /// User override; takes precedence over `recommended_stop`.
    pub chosen_stop: Option<MapLocation>,
    /// Stop inserted by the planner on the last recompute.
    pub recommended_stop: Option<MapLocation>,
    pub current_location: MapLocation,
}

/// Which case of the decision procedure applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// The driver pinned a stop.
    ChosenStop,
    /// The first checkpoint is reachable within the session.
    Direct,
    /// No session time left: stop right away.
    Immediate,
    /// Reachable today, but a break is needed first.
    WithinDay,
    /// Not reachable today: drive as far as the session allows.
    BeyondDay,
}

impl Branch {
    pub fn select(
        chosen_stop: bool,
        eta_to_first: Duration,
        session_left: Duration,
        day_left: Duration,
    ) -> Result<Self, PlannerError> {
        if chosen_stop {
            Ok(Branch::ChosenStop)
        } else if eta_to_first < session_left {
            Ok(Branch::Direct)
        } else if session_left.is_zero() {
            Ok(Branch::Immediate)
        } else if eta_to_first < day_left {
            Ok(Branch::WithinDay)
        } else if eta_to_first >= day_left {
            Ok(Branch::BeyondDay)
        } else {
            Err(PlannerError::InvalidRequest(format!(
                "no planning case for eta {}s, session {}s, day {}s",
                eta_to_first.as_secs(),
                session_left.as_secs(),
                day_left.as_secs()
            )))
        }
    }
}

/// Plans a legal, fuel-feasible route for one truck.
pub struct TripPlanner<D, P, R: RegulationHandler, F, L = NoopListener> {
    directions: D,
    places: P,
    regulations: R,
    fuel: F,
    listener: L,
    history: R::History,
    config: PlannerConfig,
    trip: Option<Trip>,
    plan: Option<PlannedRoute>,
}

impl<D, P, R, F, L> TripPlanner<D, P, R, F, L>
where
    D: DirectionsProvider,
    P: PlacesProvider,
    R: RegulationHandler,
    F: FuelTankInfo,
    L: RouteListener,
{
    pub fn new(directions: D, places: P, regulations: R, fuel: F, history: R::History, listener: L) -> Self {
        Self {
            directions,
            places,
            regulations,
            fuel,
            listener,
            history,
            config: PlannerConfig::default(),
            trip: None,
            plan: None,
        }
    }

    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Driver history used by the next recompute.
    pub fn set_history(&mut self, history: R::History) {
        self.history = history;
    }

    pub fn trip(&self) -> Option<&Trip> {
        self.trip.as_ref()
    }

    /// Start planning a new trip.
    ///
    /// All previous trip state is discarded. If the recompute fails the trip
    /// is kept (so [`update_route`](Self::update_route) can retry) but there
    /// is no active route.
    pub fn set_new_route(
        &mut self,
        start: MapLocation,
        destination: MapLocation,
        checkpoints: Vec<MapLocation>,
    ) -> Result<(), PlannerError> {
        let mut unique: Vec<MapLocation> = Vec::with_capacity(checkpoints.len());
        for checkpoint in checkpoints {
            if !unique.contains(&checkpoint) {
                unique.push(checkpoint);
            }
        }

        let trip = Trip {
            current_location: start.clone(),
            start,
            final_destination: Some(destination),
            checkpoints: unique,
            chosen_stop: None,
            recommended_stop: None,
        };
        self.plan = None;
        self.trip = Some(trip.clone());
        self.recompute(trip)
    }

    /// Re-plan from the vehicle's current position.
    pub fn update_route(&mut self, current_location: MapLocation) -> Result<(), PlannerError> {
        let mut trip = self.active_trip()?.clone();
        trip.current_location = current_location;
        if let Some(stop) = trip.chosen_stop.as_mut() {
            stop.eta = Some(self.directions.eta(&trip.current_location, stop)?);
        }
        self.recompute(trip)
    }

    /// Pin a driver-selected stop as the next waypoint.
    pub fn set_chosen_stop(&mut self, stop: MapLocation) -> Result<(), PlannerError> {
        let mut trip = self.active_trip()?.clone();
        trip.chosen_stop = Some(stop);
        trip.recommended_stop = None;
        self.recompute(trip)
    }

    /// Forget the tracked location at `location`'s coordinates.
    ///
    /// Checked in order: chosen stop, recommended stop, final destination,
    /// checkpoints. Passing the final destination ends the trip's active
    /// route. Does not recompute.
    pub fn passed_checkpoint(&mut self, location: &MapLocation) -> Result<(), PlannerError> {
        let not_found = || PlannerError::CheckpointNotFound {
            latitude: location.latitude,
            longitude: location.longitude,
        };
        let trip = self.trip.as_mut().ok_or_else(not_found)?;
        let matches = |tracked: &Option<MapLocation>| {
            tracked
                .as_ref()
                .is_some_and(|tracked| tracked.same_coordinates(location))
        };

        if matches(&trip.chosen_stop) {
            trip.chosen_stop = None;
        } else if matches(&trip.recommended_stop) {
            trip.recommended_stop = None;
        } else if matches(&trip.final_destination) {
            trip.final_destination = None;
            self.plan = None;
            info!(coords = ?location.coords(), "destination reached");
        } else if let Some(position) = trip
            .checkpoints
            .iter()
            .position(|checkpoint| checkpoint.same_coordinates(location))
        {
            trip.checkpoints.remove(position);
        } else {
            return Err(not_found());
        }
        debug!(coords = ?location.coords(), "checkpoint passed");
        Ok(())
    }

    /// Independent copy of the current plan.
    pub fn get_route(&self) -> Result<PlannedRoute, PlannerError> {
        self.plan.clone().ok_or(PlannerError::NoActiveRoute)
    }

    fn active_trip(&self) -> Result<&Trip, PlannerError> {
        self.trip
            .as_ref()
            .filter(|trip| trip.final_destination.is_some())
            .ok_or(PlannerError::NoActiveRoute)
    }

    fn recompute(&mut self, mut trip: Trip) -> Result<(), PlannerError> {
        let (plan, recommended_stop) = self.calculate(&trip)?;
        trip.recommended_stop = recommended_stop;
        self.trip = Some(trip);
        self.plan = Some(plan);
        self.listener.route_changed(&RouteChanged {
            computed_at: Utc::now(),
        });
        Ok(())
    }

    /// Run the decision procedure. Returns the plan and the stop the
    /// planner inserted, if any.
    fn calculate(&self, trip: &Trip) -> Result<(PlannedRoute, Option<MapLocation>), PlannerError> {
        let destination = trip
            .final_destination
            .as_ref()
            .ok_or(PlannerError::NoActiveRoute)?;
        let from = &trip.current_location;

        let direct = self.directions.route(from, destination, &trip.checkpoints)?;
        let session_left = self.regulations.session_time_left(&self.history).time_left;
        let day_left = self.regulations.day_time_left(&self.history).time_left;
        let eta_to_first = direct.eta_to_first_checkpoint();

        let range = self.fuel.mileage() * self.config.distance_per_unit_m;
        let fuel_range = (range < direct.distance_to_first_checkpoint()).then_some(range);

        let branch = Branch::select(trip.chosen_stop.is_some(), eta_to_first, session_left, day_left)?;
        info!(
            ?branch,
            eta_to_first = eta_to_first.as_secs(),
            session_left = session_left.as_secs(),
            day_left = day_left.as_secs(),
            fuel_limited = fuel_range.is_some(),
            "planning route"
        );

        let search = StopSearch {
            directions: &self.directions,
            places: &self.places,
            config: &self.config,
            from,
        };
        let kind = if fuel_range.is_some() {
            StopKind::Gas
        } else {
            StopKind::Rest
        };
        let stop_target = |time: Duration| match fuel_range {
            Some(range) => ReachTarget::time(time).or_distance(range),
            None => ReachTarget::time(time),
        };
        let graded = |budget: Duration| self.graded_horizons(budget, fuel_range);

        let (route, recommended, inserted, alternatives) = match branch {
            Branch::ChosenStop => {
                let Some(chosen) = trip.chosen_stop.as_ref() else {
                    return Err(PlannerError::InvalidRequest("chosen stop missing".to_string()));
                };
                let waypoints = with_leading_stop(chosen, &trip.checkpoints);
                let route = self.directions.route(from, destination, &waypoints)?;
                let displayed = chosen.clone().with_eta(route.eta_to_first_checkpoint());

                let mut horizons = vec![ReachTarget::time(self.config.immediate_stop())];
                horizons.extend(graded(session_left.min(eta_to_first)));
                let alternatives = search.alternative_stops(&direct, &horizons, kind, session_left)?;
                (route, displayed, None, alternatives)
            }
            Branch::Direct => {
                let alternatives =
                    search.alternative_stops(&direct, &graded(eta_to_first), kind, session_left)?;
                let displayed = destination.clone().with_eta(direct.eta);
                (direct, displayed, None, alternatives)
            }
            Branch::Immediate => {
                let horizon = self.config.immediate_stop();
                let budget = horizon.max(session_left);
                let optimized = search.optimized_route(
                    &direct,
                    destination,
                    &trip.checkpoints,
                    stop_target(horizon),
                    kind,
                    budget,
                )?;
                let horizons = match fuel_range {
                    Some(_) => graded(budget),
                    None => self
                        .config
                        .immediate_alternatives()
                        .into_iter()
                        .map(ReachTarget::time)
                        .collect(),
                };
                let alternatives = search.alternative_stops(&direct, &horizons, kind, budget)?;
                let stop = optimized.stop.clone();
                (optimized.route, stop.clone(), Some(stop), alternatives)
            }
            Branch::WithinDay => {
                let tighter = session_left.min(eta_to_first);
                let optimized = search.optimized_route(
                    &direct,
                    destination,
                    &trip.checkpoints,
                    stop_target(tighter / 2),
                    kind,
                    session_left,
                )?;
                let alternatives = search.alternative_stops(&direct, &graded(tighter), kind, session_left)?;
                let stop = optimized.stop.clone();
                (optimized.route, stop.clone(), Some(stop), alternatives)
            }
            Branch::BeyondDay => {
                let target = session_left.saturating_sub(self.config.safety_margin());
                let optimized = search.optimized_route(
                    &direct,
                    destination,
                    &trip.checkpoints,
                    stop_target(target),
                    kind,
                    session_left,
                )?;
                let alternatives =
                    search.alternative_stops(&direct, &graded(session_left), kind, session_left)?;
                let stop = optimized.stop.clone();
                (optimized.route, stop.clone(), Some(stop), alternatives)
            }
        };

        Ok((package(route, recommended, alternatives), inserted))
    }

    /// Alternative horizons: fractions of the time budget, or of the vehicle
    /// range when a fuel stop is mandatory.
    fn graded_horizons(&self, budget: Duration, fuel_range: Option<f64>) -> Vec<ReachTarget> {
        match fuel_range {
            Some(range) => self
                .config
                .distance_fractions(range)
                .into_iter()
                .map(ReachTarget::distance)
                .collect(),
            None => self
                .config
                .time_fractions(budget)
                .into_iter()
                .map(ReachTarget::time)
                .collect(),
        }
    }
}

fn package(route: Route, recommended_stop: MapLocation, alternative_stops: Vec<RouteLocation>) -> PlannedRoute {
    PlannedRoute {
        active_route: route,
        recommended_stop,
        alternative_stops,
    }
}
