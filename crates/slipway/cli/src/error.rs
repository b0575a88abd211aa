//! CLI error types

use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Certificate provisioning error
    #[error("Certificate error: {0}")]
    Cert(#[from] slipway_certs::CertError),

    /// Health verification setup error
    #[error("Health error: {0}")]
    Health(#[from] slipway_health::HealthError),

    /// Reconciliation error
    #[error("Reconcile error: {0}")]
    Reconcile(#[from] slipway_reconcile::ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
