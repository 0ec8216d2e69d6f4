//! OSRM HTTP adapter for route and ETA queries.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::location::{MapLocation, RouteLocation};
use crate::polyline::{PRECISION_5, Polyline};
use crate::route::Route;
use crate::traits::DirectionsProvider;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    /// Per-request timeout. Expiry is reported as `NoConnection`.
    pub timeout_secs: u64,
    /// Maximum points kept in a route's overview polyline.
    pub overview_points: usize,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
            overview_points: 64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn fetch(&self, stops: &[&MapLocation]) -> Result<OsrmRouteResponse, ProviderError> {
        let coords = stops
            .iter()
            .map(|stop| format!("{:.6},{:.6}", stop.longitude, stop.latitude))
            .collect::<Vec<_>>()
            .join(";");

        let url = format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline&steps=false",
            self.config.base_url, self.config.profile, coords
        );

        let response = self.client.get(url).send().map_err(|err| {
            if err.is_timeout() {
                ProviderError::NoConnection(format!("request timed out after {}s", self.config.timeout_secs))
            } else {
                ProviderError::NoConnection(err.to_string())
            }
        })?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ProviderError::NoConnection(format!("OSRM returned {status}")));
        }

        response
            .json::<OsrmRouteResponse>()
            .map_err(|err| ProviderError::InvalidRequest(format!("OSRM returned {status}: {err}")))
    }
}

impl DirectionsProvider for OsrmClient {
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

        let body = self.fetch(&stops)?;
        debug!(waypoints = waypoints.len(), code = %body.code, "OSRM route");
        build_route(body, destination, waypoints, Utc::now(), self.config.overview_points)
    }

    fn eta(&self, from: &MapLocation, to: &MapLocation) -> Result<Duration, ProviderError> {
        let body = self.fetch(&[from, to])?;
        let route = first_route(body)?;
        Ok(seconds(route.duration))
    }
}

fn first_route(body: OsrmRouteResponse) -> Result<OsrmRoute, ProviderError> {
    if body.code != "Ok" {
        let message = body.message.unwrap_or_default();
        return Err(ProviderError::InvalidRequest(format!("{}: {}", body.code, message)));
    }
    body.routes
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidRequest("OSRM returned no routes".to_string()))
}

fn build_route(
    body: OsrmRouteResponse,
    destination: &MapLocation,
    waypoints: &[MapLocation],
    departure: DateTime<Utc>,
    overview_points: usize,
) -> Result<Route, ProviderError> {
    let route = first_route(body)?;
    if route.legs.len() != waypoints.len() + 1 {
        return Err(ProviderError::InvalidRequest(format!(
            "OSRM returned {} legs for {} waypoints",
            route.legs.len(),
            waypoints.len()
        )));
    }

    let mut elapsed = 0.0;
    let mut travelled = 0.0;
    let checkpoints = waypoints
        .iter()
        .zip(&route.legs)
        .map(|(waypoint, leg)| {
            elapsed += leg.duration;
            travelled += leg.distance;
            RouteLocation::new(waypoint.clone(), seconds(elapsed), travelled, departure)
        })
        .collect();

    let detailed = Polyline::decode(&route.geometry, PRECISION_5)
        .map_err(|err| ProviderError::InvalidRequest(format!("bad route geometry: {err}")))?;

    Ok(Route {
        checkpoints,
        destination: RouteLocation::new(
            destination.clone(),
            seconds(route.duration),
            route.distance,
            departure,
        ),
        overview_polyline: detailed.sampled(overview_points),
        detailed_polyline: detailed,
        eta: seconds(route.duration),
        distance: route.distance,
    })
}

fn seconds(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    duration: f64,
    distance: f64,
    geometry: String,
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    duration: f64,
    distance: f64,
}
