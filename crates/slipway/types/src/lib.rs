//! Core types for the Slipway deployment harness.
//!
//! This crate is the shared vocabulary of the harness: the service
//! descriptor injected into editor configuration, the pipeline state
//! machine, health probe records, and the artifacts (backups,
//! certificate bundles) the other crates produce and consume.
//!
//! It carries no I/O; every type here is plain data.

mod artifacts;
mod descriptor;
mod health;
mod pipeline;
mod report;

pub use artifacts::{BackupRecord, CertificateBundle};
pub use descriptor::{ServiceDescriptor, Transport};
pub use health::{EndpointProbe, HealthCheckResult, HealthStatus};
pub use pipeline::{PipelineState, Stage};
pub use report::{RunReport, StageOutcome, StageReport};
