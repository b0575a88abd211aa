//! Health probe records.

use serde::{Deserialize, Serialize};

/// A single endpoint to probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointProbe {
    /// Endpoint URL (http or https).
    pub url: String,

    /// Marker that must appear in a successful response body.
    pub expected_signal: String,

    /// Accept self-signed certificates for this probe only.
    ///
    /// Never set this for production-certificate endpoints; the
    /// relaxation must stay explicit and per-probe.
    pub accept_invalid_certs: bool,
}

impl EndpointProbe {
    /// Probe with strict TLS verification.
    pub fn new(url: impl Into<String>, expected_signal: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expected_signal: expected_signal.into(),
            accept_invalid_certs: false,
        }
    }

    /// Probe an endpoint serving a self-signed certificate.
    pub fn self_signed(url: impl Into<String>, expected_signal: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expected_signal: expected_signal.into(),
            accept_invalid_certs: true,
        }
    }
}

/// Classification of one probed endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// A response satisfied the expected signal.
    Healthy,
    /// Responses were received but never satisfied the signal.
    Unhealthy,
    /// Every attempt failed at the connection level.
    Error,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
            HealthStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of probing one endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// The probed endpoint URL.
    pub endpoint: String,

    /// Final classification.
    pub status: HealthStatus,

    /// Attempts actually made.
    pub attempts: u32,

    /// Last error or unexpected-response note, if any.
    pub last_error: Option<String>,
}

impl HealthCheckResult {
    /// Whether this endpoint ended up healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
