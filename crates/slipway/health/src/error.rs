//! Error types for slipway-health.

use thiserror::Error;

/// Errors that can occur while setting up health verification.
///
/// Probe outcomes themselves are never errors; they are classified into
/// [`slipway_types::HealthStatus`] instead.
#[derive(Debug, Error)]
pub enum HealthError {
    /// The retry policy is unusable.
    #[error("invalid retry policy: {0}")]
    InvalidPolicy(String),
}

/// Result type for health verification setup.
pub type HealthResult<T> = Result<T, HealthError>;
