use thiserror::Error;

/// Errors from the road-routing layer.
#[derive(Debug, Error)]
pub enum DirectionsError {
    /// Provider unreachable, failed, or returned unusable data.
    /// There is no straight-line fallback; callers decide what to do.
    #[error("road routing unavailable: {reason}")]
    RoutingUnavailable { reason: String },

    /// The waypoint sequence cannot be routed at all.
    #[error("invalid waypoints: {reason}")]
    InvalidWaypoints { reason: String },

    #[error("invalid directions configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl DirectionsError {
    pub(crate) fn unavailable(reason: impl Into<String>) -> Self {
        DirectionsError::RoutingUnavailable {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DirectionsError::RoutingUnavailable { .. })
    }
}

impl From<reqwest::Error> for DirectionsError {
    fn from(err: reqwest::Error) -> Self {
        DirectionsError::unavailable(err.to_string())
    }
}
