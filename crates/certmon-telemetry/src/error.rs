//! Error types for telemetry access.

use certmon_route::RouteError;
use thiserror::Error;

/// Result type for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Errors that can occur while reading telemetry or resolving a route.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// No certificate vote recorded for the round
    #[error("no vote found for round {round}")]
    NoVote { round: u64 },

    /// No certificate vote from this authenticator in the round
    #[error("no vote found for round {round} from {sender}")]
    NoVoteFrom { round: u64, sender: String },

    /// Route reconstruction rejected its input
    #[error("route error: {0}")]
    Route(#[from] RouteError),

    /// Request value could not be parsed
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// Whether this error just means "nothing to show" rather than a fault.
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            TelemetryError::NoVote { .. }
                | TelemetryError::NoVoteFrom { .. }
                | TelemetryError::Route(RouteError::InvalidInput(_))
        )
    }
}
