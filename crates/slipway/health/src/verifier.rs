//! Health verifier.
//!
//! Probes declared endpoints with bounded retries and classifies each
//! as healthy, unhealthy, or error. Verification is pure: it never
//! mutates deployment state, and distinct endpoints share nothing, so
//! probing order cannot affect the outcome.

use std::time::Duration;

use tracing::{debug, info, warn};

use slipway_types::{EndpointProbe, HealthCheckResult, HealthStatus};

use crate::error::{HealthError, HealthResult};

/// Floor below which inter-attempt delays are clamped.
const MIN_DELAY: Duration = Duration::from_millis(100);

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Delay strategy between attempts against one endpoint.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// Same delay after every attempt.
    Fixed(Duration),
    /// Delay grows linearly: `base * attempt`.
    Linear(Duration),
}

impl Backoff {
    /// Delay to wait after attempt number `attempt` (1-based).
    fn delay(&self, attempt: u32) -> Duration {
        let raw = match self {
            Backoff::Fixed(d) => *d,
            Backoff::Linear(base) => base.saturating_mul(attempt),
        };
        raw.max(MIN_DELAY)
    }
}

/// Attempt budget and backoff for one verification pass.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per endpoint; at least 1.
    pub max_attempts: u32,

    /// Delay strategy between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Backoff::Fixed(Duration::from_secs(2)),
        }
    }
}

/// Probes endpoints and classifies the results.
pub struct HealthVerifier {
    policy: RetryPolicy,
    request_timeout: Duration,
}

impl HealthVerifier {
    /// Verifier with the given retry policy.
    pub fn new(policy: RetryPolicy) -> HealthResult<Self> {
        if policy.max_attempts == 0 {
            return Err(HealthError::InvalidPolicy(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(Self {
            policy,
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Probe every endpoint, concurrently across endpoints.
    ///
    /// Retries for a single endpoint stay strictly sequential; each
    /// attempt waits out its backoff before the next begins.
    pub async fn probe_all(&self, probes: &[EndpointProbe]) -> Vec<HealthCheckResult> {
        let futures = probes.iter().map(|probe| self.probe_one(probe));
        futures::future::join_all(futures).await
    }

    /// Probe a single endpoint until it satisfies its signal or the
    /// attempt budget runs out.
    pub async fn probe_one(&self, probe: &EndpointProbe) -> HealthCheckResult {
        let client = match self.build_client(probe) {
            Ok(client) => client,
            Err(e) => {
                return HealthCheckResult {
                    endpoint: probe.url.clone(),
                    status: HealthStatus::Error,
                    attempts: 0,
                    last_error: Some(e.to_string()),
                };
            }
        };

        let mut saw_response = false;
        let mut last_error = None;

        for attempt in 1..=self.policy.max_attempts {
            match self.attempt(&client, probe).await {
                Ok(body) if body.contains(&probe.expected_signal) => {
                    info!(endpoint = %probe.url, attempt, "endpoint healthy");
                    return HealthCheckResult {
                        endpoint: probe.url.clone(),
                        status: HealthStatus::Healthy,
                        attempts: attempt,
                        last_error: None,
                    };
                }
                Ok(body) => {
                    saw_response = true;
                    let snippet: String = body.chars().take(120).collect();
                    debug!(endpoint = %probe.url, attempt, "response missing expected signal");
                    last_error = Some(format!("response did not contain expected signal: {snippet}"));
                }
                Err(e) => {
                    debug!(endpoint = %probe.url, attempt, error = %e, "probe attempt failed");
                    last_error = Some(e.to_string());
                }
            }

            if attempt < self.policy.max_attempts {
                tokio::time::sleep(self.policy.backoff.delay(attempt)).await;
            }
        }

        let status = if saw_response {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Error
        };
        warn!(endpoint = %probe.url, %status, "endpoint failed verification");

        HealthCheckResult {
            endpoint: probe.url.clone(),
            status,
            attempts: self.policy.max_attempts,
            last_error,
        }
    }

    /// One GET against the endpoint, returning the body on any response.
    async fn attempt(
        &self,
        client: &reqwest::Client,
        probe: &EndpointProbe,
    ) -> Result<String, reqwest::Error> {
        let response = client.get(&probe.url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        // A non-2xx response still counts as a received response; the
        // signal check decides healthy vs unhealthy.
        debug!(endpoint = %probe.url, %status, "received response");
        Ok(body)
    }

    /// Client for one probe. TLS relaxation is per-probe and explicit;
    /// it is never inherited by other endpoints.
    fn build_client(&self, probe: &EndpointProbe) -> Result<reqwest::Client, reqwest::Error> {
        let mut builder = reqwest::Client::builder().timeout(self.request_timeout);
        if probe.accept_invalid_certs {
            warn!(endpoint = %probe.url, "accepting invalid certificates for this probe");
            builder = builder.danger_accept_invalid_certs(true);
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve canned HTTP responses; the body for connection `n` comes
    /// from `bodies[min(n, len-1)]`.
    async fn serve(bodies: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicU32::new(0));

        tokio::spawn(async move {
            loop {
                let (mut socket, _) = match listener.accept().await {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                let n = hits.fetch_add(1, Ordering::SeqCst) as usize;
                let body = bodies[n.min(bodies.len() - 1)];
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{}/health", addr)
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff: Backoff::Fixed(Duration::from_millis(1)),
        }
    }

    #[tokio::test]
    async fn test_healthy_on_first_attempt() {
        let url = serve(vec![r#"{"status":"healthy"}"#]).await;
        let verifier = HealthVerifier::new(fast_policy(3)).unwrap();

        let result = verifier.probe_one(&EndpointProbe::new(url, "healthy")).await;

        assert_eq!(result.status, HealthStatus::Healthy);
        assert_eq!(result.attempts, 1);
        assert!(result.last_error.is_none());
    }

    #[tokio::test]
    async fn test_healthy_on_later_attempt() {
        let url = serve(vec!["starting", "starting", r#"{"status":"healthy"}"#]).await;
        let verifier = HealthVerifier::new(fast_policy(5)).unwrap();

        let result = verifier.probe_one(&EndpointProbe::new(url, "healthy")).await;

        assert_eq!(result.status, HealthStatus::Healthy);
        assert_eq!(result.attempts, 3);
    }

    #[tokio::test]
    async fn test_signal_never_satisfied_is_unhealthy() {
        let url = serve(vec!["starting"]).await;
        let verifier = HealthVerifier::new(fast_policy(3)).unwrap();

        let result = verifier.probe_one(&EndpointProbe::new(url, "healthy")).await;

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(result.attempts, 3);
        assert!(result.last_error.unwrap().contains("expected signal"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        // Bind then drop to get an address nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let verifier = HealthVerifier::new(fast_policy(2)).unwrap();
        let probe = EndpointProbe::new(format!("http://{}/health", addr), "healthy");
        let result = verifier.probe_one(&probe).await;

        assert_eq!(result.status, HealthStatus::Error);
        assert_eq!(result.attempts, 2);
        assert!(result.last_error.is_some());
    }

    #[tokio::test]
    async fn test_endpoints_are_probed_independently() {
        let healthy = serve(vec![r#"{"status":"healthy"}"#]).await;
        let unhealthy = serve(vec!["starting"]).await;
        let verifier = HealthVerifier::new(fast_policy(2)).unwrap();

        let probes = vec![
            EndpointProbe::new(healthy, "healthy"),
            EndpointProbe::new(unhealthy, "healthy"),
        ];
        let results = verifier.probe_all(&probes).await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, HealthStatus::Healthy);
        assert_eq!(results[1].status, HealthStatus::Unhealthy);
    }

    #[test]
    fn test_zero_attempts_is_rejected() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff: Backoff::Fixed(Duration::from_secs(1)),
        };
        assert!(HealthVerifier::new(policy).is_err());
    }

    #[test]
    fn test_backoff_enforces_minimum_delay() {
        let backoff = Backoff::Fixed(Duration::from_millis(1));
        assert_eq!(backoff.delay(1), MIN_DELAY);

        let linear = Backoff::Linear(Duration::from_millis(200));
        assert_eq!(linear.delay(3), Duration::from_millis(600));
    }
}
