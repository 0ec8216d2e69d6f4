//! Location value types: plain coordinates and route-positioned locations.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A coordinate with optional address and ETA.
///
/// Equality compares coordinates only; address, ETA and motion are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Speed in m/s, when known.
    pub speed: Option<f32>,
    /// Bearing in degrees, when known.
    pub bearing: Option<f32>,
    pub address: Option<String>,
    /// Estimated time until arrival at this location.
    pub eta: Option<Duration>,
}

impl MapLocation {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..Default::default()
        }
    }

    /// Location from a (lat, lng) tuple.
    pub fn from_coords((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_eta(mut self, eta: Duration) -> Self {
        self.eta = Some(eta);
        self
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn same_coordinates(&self, other: &MapLocation) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }

    /// Count the ETA down by `elapsed`, stopping at zero.
    pub fn elapse(&mut self, elapsed: Duration) {
        if let Some(eta) = self.eta.as_mut() {
            *eta = eta.saturating_sub(elapsed);
        }
    }
}

impl PartialEq for MapLocation {
    fn eq(&self, other: &Self) -> bool {
        self.same_coordinates(other)
    }
}

/// A location positioned along a specific route query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLocation {
    pub location: MapLocation,
    /// Cumulative distance from the route origin in meters.
    pub distance_from_origin: f64,
    pub arrival: DateTime<Utc>,
}

impl RouteLocation {
    /// Position `location` on a route, stamping its cumulative ETA.
    pub fn new(
        location: MapLocation,
        eta: Duration,
        distance_from_origin: f64,
        departure: DateTime<Utc>,
    ) -> Self {
        Self {
            location: location.with_eta(eta),
            distance_from_origin,
            arrival: arrival_after(departure, eta),
        }
    }

    pub fn eta(&self) -> Duration {
        self.location.eta.unwrap_or(Duration::ZERO)
    }

    pub fn coords(&self) -> (f64, f64) {
        self.location.coords()
    }
}

/// Absolute arrival time after travelling for `eta` from `departure`.
pub fn arrival_after(departure: DateTime<Utc>, eta: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(eta)
        .ok()
        .and_then(|delta| departure.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
