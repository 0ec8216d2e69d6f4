//! Tuning parameters for the trip planner.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for stop search and the decision procedure.
///
/// Deserializes from JSON; missing fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Width of the ETA window below a time target (minutes).
    pub reach_tolerance_mins: u64,

    /// Width of the distance window below a distance target (meters).
    pub reach_distance_tolerance_m: f64,

    /// Horizon for a forced stop when no session time is left (minutes).
    pub immediate_stop_mins: u64,

    /// Alternative horizons offered when no session time is left (minutes).
    pub immediate_alternative_mins: Vec<u64>,

    /// Safety margin subtracted from the session budget when the destination
    /// is out of reach for the day (minutes).
    pub safety_margin_mins: u64,

    /// Number of provider-ranked candidates evaluated per stop search.
    pub max_candidates: usize,

    /// Meters of range per unit reported by the fuel tank.
    pub distance_per_unit_m: f64,

    /// Divisors applied to a time or range budget to grade alternatives.
    pub alternative_fractions: Vec<u32>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            reach_tolerance_mins: 5,
            reach_distance_tolerance_m: 5_000.0,
            immediate_stop_mins: 5,
            immediate_alternative_mins: vec![10, 15, 20],
            safety_margin_mins: 10,
            max_candidates: 5,
            distance_per_unit_m: 1_000.0,
            alternative_fractions: vec![2, 3, 4],
        }
    }
}

impl PlannerConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn reach_tolerance(&self) -> Duration {
        minutes(self.reach_tolerance_mins)
    }

    pub fn immediate_stop(&self) -> Duration {
        minutes(self.immediate_stop_mins)
    }

    pub fn immediate_alternatives(&self) -> Vec<Duration> {
        self.immediate_alternative_mins
            .iter()
            .map(|mins| minutes(*mins))
            .collect()
    }

    pub fn safety_margin(&self) -> Duration {
        minutes(self.safety_margin_mins)
    }

    /// Graded fractions of a time budget, e.g. 1/2, 1/3, 1/4.
    pub fn time_fractions(&self, budget: Duration) -> Vec<Duration> {
        self.alternative_fractions
            .iter()
            .filter(|divisor| **divisor > 0)
            .map(|divisor| budget / *divisor)
            .collect()
    }

    /// Graded fractions of a distance budget in meters.
    pub fn distance_fractions(&self, meters: f64) -> Vec<f64> {
        self.alternative_fractions
            .iter()
            .filter(|divisor| **divisor > 0)
            .map(|divisor| meters / f64::from(*divisor))
            .collect()
    }
}

fn minutes(mins: u64) -> Duration {
    Duration::from_secs(mins.saturating_mul(60))
}
