//! Error types for the dashboard server.

use certmon_telemetry::TelemetryError;
use thiserror::Error;

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur while configuring or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Invalid configuration value
    #[error("Config error: {0}")]
    Config(String),

    /// Telemetry could not be loaded
    #[error("Telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
