//! TLS bundle provisioning for the Slipway harness.
//!
//! A bundle is a matched certificate/private-key pair on disk. The store
//! is idempotent: a valid existing pair is never regenerated, and a
//! missing or half-present pair is recreated atomically.

mod error;
mod store;

pub use error::{CertError, CertResult};
pub use store::CertificateStore;
