//! Haversine directions provider (fallback when OSRM is unavailable).
//!
//! Routes are straight great-circle legs between consecutive stops, driven
//! at an assumed constant speed. Less accurate than OSRM (ignores roads)
//! but always available and deterministic.

use std::time::Duration;

use chrono::Utc;

use crate::error::ProviderError;
use crate::location::{MapLocation, RouteLocation};
use crate::polyline::Polyline;
use crate::route::Route;
use crate::traits::DirectionsProvider;

/// Average truck speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 80.0;

/// Spacing of interpolated polyline points.
const DEFAULT_STEP_KM: f64 = 1.0;

/// Points kept in the overview polyline.
const OVERVIEW_POINTS: usize = 64;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine-based directions provider.
#[derive(Debug, Clone)]
pub struct HaversineDirections {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
    /// Distance between interpolated polyline points in km.
    pub step_km: f64,
}

impl Default for HaversineDirections {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
            step_km: DEFAULT_STEP_KM,
        }
    }
}

impl HaversineDirections {
    pub fn new(speed_kmh: f64) -> Self {
        Self {
            speed_kmh,
            ..Default::default()
        }
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    /// Convert distance in km to travel time.
    fn travel_time(&self, km: f64) -> Duration {
        Duration::from_secs_f64((km / self.speed_kmh * 3600.0).max(0.0))
    }

    fn validate(&self, stops: &[&MapLocation]) -> Result<(), ProviderError> {
        if !(self.speed_kmh > 0.0) {
            return Err(ProviderError::InvalidRequest(format!(
                "speed must be positive, got {}",
                self.speed_kmh
            )));
        }
        for stop in stops {
            if !(-90.0..=90.0).contains(&stop.latitude) || !(-180.0..=180.0).contains(&stop.longitude) {
                return Err(ProviderError::InvalidRequest(format!(
                    "coordinate out of range: ({}, {})",
                    stop.latitude, stop.longitude
                )));
            }
        }
        Ok(())
    }

    /// Points from `from` (exclusive) to `to` (inclusive), roughly `step_km` apart.
    fn interpolate(&self, from: (f64, f64), to: (f64, f64), km: f64) -> Vec<(f64, f64)> {
        let steps = if self.step_km > 0.0 {
            (km / self.step_km).ceil().max(1.0) as usize
        } else {
            1
        };
        (1..=steps)
            .map(|step| {
                let t = step as f64 / steps as f64;
                (from.0 + (to.0 - from.0) * t, from.1 + (to.1 - from.1) * t)
            })
            .collect()
    }
}

impl DirectionsProvider for HaversineDirections {
    fn route(
        &self,
        origin: &MapLocation,
        destination: &MapLocation,
        waypoints: &[MapLocation],
    ) -> Result<Route, ProviderError> {
        let mut stops: Vec<&MapLocation> = Vec::with_capacity(waypoints.len() + 2);
        stops.push(origin);
        stops.extend(waypoints);
        stops.push(destination);
        self.validate(&stops)?;

        let departure = Utc::now();
        let mut points = vec![origin.coords()];
        let mut legs_km = Vec::with_capacity(stops.len() - 1);
        for pair in stops.windows(2) {
            let (from, to) = (pair[0].coords(), pair[1].coords());
            let km = Self::haversine_km(from, to);
            points.extend(self.interpolate(from, to, km));
            legs_km.push(km);
        }

        let mut travelled_km = 0.0;
        let mut positioned = stops[1..]
            .iter()
            .zip(&legs_km)
            .map(|(stop, km)| {
                travelled_km += km;
                RouteLocation::new(
                    (*stop).clone(),
                    self.travel_time(travelled_km),
                    travelled_km * 1000.0,
                    departure,
                )
            })
            .collect::<Vec<_>>();

        let Some(destination) = positioned.pop() else {
            return Err(ProviderError::InvalidRequest("route has no destination".to_string()));
        };
        let detailed = Polyline::new(points);

        Ok(Route {
            checkpoints: positioned,
            eta: destination.eta(),
            distance: destination.distance_from_origin,
            destination,
            overview_polyline: detailed.sampled(OVERVIEW_POINTS),
            detailed_polyline: detailed,
        })
    }

    fn eta(&self, from: &MapLocation, to: &MapLocation) -> Result<Duration, ProviderError> {
        self.validate(&[from, to])?;
        Ok(self.travel_time(Self::haversine_km(from.coords(), to.coords())))
    }
}
