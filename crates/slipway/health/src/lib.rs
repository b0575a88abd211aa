//! Endpoint health verification for the Slipway harness.
//!
//! A pure verification step: endpoints are probed independently with a
//! bounded attempt budget and classified as healthy, unhealthy, or
//! error. Callers interpret the aggregate to decide how to proceed;
//! nothing here mutates deployment state.

mod error;
mod verifier;

pub use error::{HealthError, HealthResult};
pub use verifier::{Backoff, HealthVerifier, RetryPolicy};
