//! Error types for route reconstruction.

use thiserror::Error;

/// Result type for route operations.
pub type Result<T> = std::result::Result<T, RouteError>;

/// Errors that can occur while reconstructing or projecting a vote route.
///
/// Reconstruction itself is best-effort: missing relay names or stray edges
/// degrade to empty annotations instead of errors. The only hard failure is
/// a missing seed observation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// No origin observation was supplied (no seed vote upstream).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The graph style selector is not one of tree/flow/geo.
    #[error("unknown graph style: {0:?}")]
    UnknownGraphStyle(String),
}
