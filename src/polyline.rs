//! Polyline representation for route geometries.
//!
//! Routes carry polylines as decoded coordinate sequences. Decoding from the
//! compact encoded format happens at the provider boundary (see
//! [`Polyline::decode`]), never inside the planner.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coordinate precision used by OSRM's `geometries=polyline` output.
pub const PRECISION_5: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("polyline truncated at byte {0}")]
    Truncated(usize),
    #[error("invalid polyline byte {byte:#x} at {position}")]
    InvalidByte { byte: u8, position: usize },
}

/// A polyline representing a route geometry as decoded coordinates.
///
/// Each point is a (latitude, longitude) tuple, ordered from route origin to
/// destination.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Decode an encoded polyline string at the given precision.
    pub fn decode(encoded: &str, precision: u32) -> Result<Self, PolylineError> {
        let factor = 10_f64.powi(precision as i32);
        let bytes = encoded.as_bytes();
        let mut points = Vec::new();
        let mut position = 0;
        let (mut lat, mut lng) = (0_i64, 0_i64);

        while position < bytes.len() {
            lat += next_delta(bytes, &mut position)?;
            lng += next_delta(bytes, &mut position)?;
            points.push((lat as f64 / factor, lng as f64 / factor));
        }

        Ok(Self { points })
    }

    /// A coarser copy with at most `max_points` points.
    ///
    /// Points are taken at an even stride; first and last are always kept.
    pub fn sampled(&self, max_points: usize) -> Self {
        let len = self.points.len();
        if len <= max_points || max_points < 2 {
            return self.clone();
        }

        let last = len - 1;
        let slots = max_points - 1;
        let mut points: Vec<(f64, f64)> = (0..=slots)
            .map(|slot| self.points[slot * last / slots])
            .collect();
        points.dedup();
        Self { points }
    }
}

fn next_delta(bytes: &[u8], position: &mut usize) -> Result<i64, PolylineError> {
    let mut result = 0_i64;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*position).ok_or(PolylineError::Truncated(*position))?;
        if !(63..=126).contains(&byte) || shift > 60 {
            return Err(PolylineError::InvalidByte {
                byte,
                position: *position,
            });
        }
        *position += 1;

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 == 1 { !(result >> 1) } else { result >> 1 })
}
