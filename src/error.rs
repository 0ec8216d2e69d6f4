//! Error types for providers and the trip planner.

use thiserror::Error;

/// Failures reported by routing and places collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Transport failure or timeout. Retryable with backoff.
    #[error("no connection to provider: {0}")]
    NoConnection(String),

    /// The provider rejected the request (bad coordinates, no route, ...).
    #[error("invalid provider request: {0}")]
    InvalidRequest(String),
}

/// Errors returned by [`TripPlanner`](crate::planner::TripPlanner) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlannerError {
    /// No plan has been computed yet, or the destination has been reached.
    #[error("no active route")]
    NoActiveRoute,

    /// `passed_checkpoint` was called with a location the trip does not track.
    #[error("no tracked checkpoint at ({latitude}, {longitude})")]
    CheckpointNotFound { latitude: f64, longitude: f64 },

    /// No candidate stop keeps the trip within the regulation budget.
    #[error("no feasible stop: {0}")]
    NoFeasibleStop(String),

    /// The planner was asked for something it cannot express.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A collaborator failed; passed through unmodified.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl PlannerError {
    /// True only for transient connectivity failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlannerError::Provider(ProviderError::NoConnection(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_pass_through_display() {
        let err = PlannerError::from(ProviderError::NoConnection("timed out".into()));
        assert_eq!(err.to_string(), "no connection to provider: timed out");
        assert!(err.is_retryable());
    }

    #[test]
    fn structural_errors_are_not_retryable() {
        let err = PlannerError::from(ProviderError::InvalidRequest("NoRoute".into()));
        assert!(!err.is_retryable());
        assert!(!PlannerError::NoFeasibleStop("none".into()).is_retryable());
        assert!(!PlannerError::NoActiveRoute.is_retryable());
    }

    #[test]
    fn checkpoint_not_found_names_coordinates() {
        let err = PlannerError::CheckpointNotFound {
            latitude: 57.5,
            longitude: 12.25,
        };
        assert_eq!(err.to_string(), "no tracked checkpoint at (57.5, 12.25)");
    }
}
