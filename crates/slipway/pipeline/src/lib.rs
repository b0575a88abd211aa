//! Deployment pipeline for the Slipway harness.
//!
//! The orchestrator sequences the stages of one deployment run —
//! certificates, external build, external start, health verification,
//! configuration reconciliation — over a strictly forward-moving state
//! machine, and folds each stage's outcome into a single run report.

mod orchestrator;
mod runner;

pub use orchestrator::{DeploymentOrchestrator, DeploymentPlan, RunOptions};
pub use runner::{ComposeRunner, ProcessComposeRunner, RunnerError, RunnerResult};
