//! Test fixtures for haul-planner.
//!
//! Provides deterministic collaborators:
//! - `LinearDirections`: polyline point `i` sits at latitude `i`, reached after
//!   `i` minutes and `i` km
//! - `CountingDirections`: wraps any provider, counts calls, can be switched
//!   to fail with `NoConnection`
//! - `StubPlaces`, `FixedRegulations`, `FixedFuel`

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use haul_planner::error::ProviderError;
use haul_planner::location::{MapLocation, RouteLocation};
use haul_planner::polyline::Polyline;
use haul_planner::route::Route;
use haul_planner::stops::StopKind;
use haul_planner::traits::{DirectionsProvider, FuelTankInfo, PlacesProvider, RegulationHandler, TimeLeft};

pub fn mins(m: u64) -> Duration {
    Duration::from_secs(m * 60)
}

// ============================================================================
// Directions
// ============================================================================

/// Polyline of `n` points along the prime meridian, one per latitude degree.
pub fn linear_polyline(n: usize) -> Polyline {
    Polyline::new((0..n).map(|i| (i as f64, 0.0)).collect())
}

/// One minute and one kilometer per degree of latitude.
#[derive(Debug, Default)]
pub struct LinearDirections {
    pub calls: AtomicUsize,
    pub max_waypoints: AtomicUsize,
}

impl LinearDirections {
    fn position(origin: &MapLocation, stop: &MapLocation, departure: chrono::DateTime<Utc>) -> RouteLocation {
        let degrees = (stop.latitude - origin.latitude).abs();
        RouteLocation::new(
            stop.clone(),
            Duration::from_secs_f64(degrees * 60.0),
            degrees * 1000.0,
            departure,
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DirectionsProvider for LinearDirections {
    fn route(
        &self,
        origin: &MapLocation,
        destination: &MapLocation,
        waypoints: &[MapLocation],
    ) -> Result<Route, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.max_waypoints.fetch_max(waypoints.len(), Ordering::SeqCst);

        let departure = Utc::now();
        let destination = Self::position(origin, destination, departure);
        Ok(Route {
            checkpoints: waypoints
                .iter()
                .map(|waypoint| Self::position(origin, waypoint, departure))
                .collect(),
            eta: destination.eta(),
            distance: destination.distance_from_origin,
            overview_polyline: Polyline::new(vec![origin.coords(), destination.coords()]),
            detailed_polyline: Polyline::default(),
            destination,
        })
    }

    fn eta(&self, from: &MapLocation, to: &MapLocation) -> Result<Duration, ProviderError> {
        Ok(Duration::from_secs_f64((to.latitude - from.latitude).abs() * 60.0))
    }
}

/// Counts calls to an inner provider and fails on demand.
#[derive(Debug, Clone)]
pub struct CountingDirections<D> {
    inner: Arc<D>,
    pub route_calls: Arc<AtomicUsize>,
    pub eta_calls: Arc<AtomicUsize>,
    pub failing: Arc<AtomicBool>,
}

impl<D> CountingDirections<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner: Arc::new(inner),
            route_calls: Arc::default(),
            eta_calls: Arc::default(),
            failing: Arc::default(),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), ProviderError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(ProviderError::NoConnection("network unreachable".to_string()))
        } else {
            Ok(())
        }
    }
}

impl<D: DirectionsProvider> DirectionsProvider for CountingDirections<D> {
    fn route(
        &self,
        origin: &MapLocation,
        destination: &MapLocation,
        waypoints: &[MapLocation],
    ) -> Result<Route, ProviderError> {
        self.route_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.route(origin, destination, waypoints)
    }

    fn eta(&self, from: &MapLocation, to: &MapLocation) -> Result<Duration, ProviderError> {
        self.eta_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.inner.eta(from, to)
    }
}

// ============================================================================
// Places
// ============================================================================

type PoiRule = Box<dyn Fn((f64, f64)) -> Vec<MapLocation>>;

/// Places provider answering from closures, logging every query.
pub struct StubPlaces {
    rest: PoiRule,
    gas: PoiRule,
    pub queries: Arc<Mutex<Vec<(StopKind, (f64, f64))>>>,
}

impl StubPlaces {
    pub fn new(
        rest: impl Fn((f64, f64)) -> Vec<MapLocation> + 'static,
        gas: impl Fn((f64, f64)) -> Vec<MapLocation> + 'static,
    ) -> Self {
        Self {
            rest: Box::new(rest),
            gas: Box::new(gas),
            queries: Arc::default(),
        }
    }

    /// One rest area and one gas station `lat_offset` degrees from each query.
    pub fn offset(lat_offset: f64) -> Self {
        Self::new(
            move |(lat, lng)| vec![MapLocation::new(lat + lat_offset, lng).with_address(format!("Rest area {lat:.3}"))],
            move |(lat, lng)| vec![MapLocation::new(lat + lat_offset, lng).with_address(format!("Gas station {lat:.3}"))],
        )
    }

    pub fn empty() -> Self {
        Self::new(|_| Vec::new(), |_| Vec::new())
    }

    fn log(&self, kind: StopKind, at: (f64, f64)) {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push((kind, at));
        }
    }
}

impl PlacesProvider for StubPlaces {
    fn nearby_rest_locations(&self, at: (f64, f64)) -> Result<Vec<MapLocation>, ProviderError> {
        self.log(StopKind::Rest, at);
        Ok((self.rest)(at))
    }

    fn nearby_gas_stations(&self, at: (f64, f64)) -> Result<Vec<MapLocation>, ProviderError> {
        self.log(StopKind::Gas, at);
        Ok((self.gas)(at))
    }
}

// ============================================================================
// Regulation and fuel
// ============================================================================

/// Regulation handler with fixed budgets; history is ignored.
#[derive(Debug, Clone, Copy)]
pub struct FixedRegulations {
    pub session: Duration,
    pub day: Duration,
}

impl FixedRegulations {
    pub fn minutes(session: u64, day: u64) -> Self {
        Self {
            session: mins(session),
            day: mins(day),
        }
    }
}

impl RegulationHandler for FixedRegulations {
    type History = ();

    fn session_time_left(&self, _history: &Self::History) -> TimeLeft {
        TimeLeft::new(self.session, self.session)
    }

    fn day_time_left(&self, _history: &Self::History) -> TimeLeft {
        TimeLeft::new(self.day, self.day)
    }
}

/// Fuel tank reporting a fixed range in kilometers.
#[derive(Debug, Clone, Copy)]
pub struct FixedFuel(pub f64);

impl FuelTankInfo for FixedFuel {
    fn mileage(&self) -> f64 {
        self.0
    }
}
