//! Deployment orchestrator.
//!
//! Drives the pipeline state machine: certificates, build, deploy,
//! verify, reconcile. Certificate and deploy failures halt the run;
//! degraded health is reported but does not stop reconciliation — an
//! unhealthy service is still worth having its config entry present
//! for a later retry. Reconciliation failures are reported and never
//! roll back the already-deployed services.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{error, info, warn};

use slipway_certs::CertificateStore;
use slipway_health::HealthVerifier;
use slipway_reconcile::ConfigReconciler;
use slipway_types::{
    EndpointProbe, PipelineState, RunReport, ServiceDescriptor, Stage, StageOutcome, StageReport,
};

use crate::runner::ComposeRunner;

/// Everything one deployment run needs to know, fixed up front.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    /// Certificate subject name.
    pub subject: String,

    /// Entry to splice into the server registry document.
    pub descriptor: ServiceDescriptor,

    /// Server registry document path.
    pub registry_path: PathBuf,

    /// Editor settings document path, when that target is enabled.
    pub settings_path: Option<PathBuf>,

    /// Flat settings entries owned by this integration.
    pub settings_entries: Map<String, Value>,

    /// Endpoints to verify after deploy.
    pub probes: Vec<EndpointProbe>,
}

/// Per-run skip flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Skip the external build stage.
    pub skip_build: bool,

    /// Skip configuration reconciliation.
    pub skip_config: bool,
}

/// The top-level pipeline state machine.
pub struct DeploymentOrchestrator {
    certs: CertificateStore,
    runner: Arc<dyn ComposeRunner>,
    verifier: HealthVerifier,
    reconciler: ConfigReconciler,
    plan: DeploymentPlan,
    options: RunOptions,
    state: PipelineState,
}

impl DeploymentOrchestrator {
    pub fn new(
        certs: CertificateStore,
        runner: Arc<dyn ComposeRunner>,
        verifier: HealthVerifier,
        reconciler: ConfigReconciler,
        plan: DeploymentPlan,
        options: RunOptions,
    ) -> Self {
        Self {
            certs,
            runner,
            verifier,
            reconciler,
            plan,
            options,
            state: PipelineState::NotStarted,
        }
    }

    /// Current pipeline state.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    fn advance(&mut self, next: PipelineState) {
        debug_assert!(self.state.can_advance_to(&next), "illegal transition");
        info!(state = %next, "pipeline advanced");
        self.state = next;
    }

    fn halt(&mut self, report: &mut RunReport, stage: Stage, reason: String) {
        error!(%stage, %reason, "pipeline halted");
        self.state = PipelineState::Failed {
            stage,
            reason: reason.clone(),
        };
        report.record(StageReport::failed(stage, reason));
        report.finish(self.state.clone());
    }

    /// Run the pipeline once. Safe to call again on the same
    /// configuration: every stage is individually idempotent.
    pub async fn run(&mut self) -> RunReport {
        self.state = PipelineState::NotStarted;
        let mut report = RunReport::begin();

        // Certificates: fatal on failure.
        match self.certs.ensure(&self.plan.subject) {
            Ok(bundle) => {
                self.advance(PipelineState::CertificatesReady);
                report.record(
                    StageReport::passed(Stage::Certificates)
                        .with_detail(format!("bundle at {}", bundle.cert_path.display())),
                );
            }
            Err(e) => {
                self.halt(&mut report, Stage::Certificates, e.to_string());
                return report;
            }
        }

        // Build: skippable, fatal on failure.
        if self.options.skip_build {
            report.record(StageReport::skipped(Stage::Build));
        } else if let Err(e) = self.runner.build().await {
            self.halt(&mut report, Stage::Build, e.to_string());
            return report;
        } else {
            report.record(StageReport::passed(Stage::Build));
        }
        self.advance(PipelineState::Built);

        // Deploy: fatal on failure.
        if let Err(e) = self.runner.up().await {
            self.halt(&mut report, Stage::Deploy, e.to_string());
            return report;
        }
        report.record(StageReport::passed(Stage::Deploy));
        self.advance(PipelineState::Deployed);

        // Verify: degrades the report, never halts the pipeline.
        report.record(self.verify_stage().await);
        self.advance(PipelineState::Verified);

        // Reconcile: skippable; failure is terminal to the stage only.
        let reconcile_report = if self.options.skip_config {
            StageReport::skipped(Stage::Reconcile)
        } else {
            self.reconcile_stage()
        };
        let reconcile_failed = (reconcile_report.outcome == StageOutcome::Failed)
            .then(|| reconcile_report.detail.clone().unwrap_or_default());
        report.record(reconcile_report);
        self.advance(PipelineState::ConfigReconciled);

        match reconcile_failed {
            Some(reason) => {
                self.state = PipelineState::Failed {
                    stage: Stage::Reconcile,
                    reason,
                };
            }
            None => self.advance(PipelineState::Complete),
        }
        report.finish(self.state.clone());
        report
    }

    async fn verify_stage(&self) -> StageReport {
        if self.plan.probes.is_empty() {
            return StageReport::passed(Stage::Verify).with_detail("no endpoints declared");
        }

        let results = self.verifier.probe_all(&self.plan.probes).await;
        let unhealthy: Vec<_> = results.iter().filter(|r| !r.is_healthy()).collect();

        if unhealthy.is_empty() {
            StageReport::passed(Stage::Verify)
                .with_detail(format!("{} endpoint(s) healthy", results.len()))
        } else {
            let detail = unhealthy
                .iter()
                .map(|r| format!("{} is {}", r.endpoint, r.status))
                .collect::<Vec<_>>()
                .join("; ");
            warn!(%detail, "health verification degraded; continuing to reconciliation");
            StageReport::degraded(Stage::Verify, unhealthy.len() as u32, detail)
        }
    }

    fn reconcile_stage(&self) -> StageReport {
        let mut details = Vec::new();
        let mut warnings = 0;

        let registry = self
            .reconciler
            .reconcile_servers(&self.plan.registry_path, &self.plan.descriptor);
        match registry {
            Ok(result) => {
                if let Some(backup) = &result.backup {
                    details.push(format!("backup: {}", backup.backup_path.display()));
                }
                if result.lossy {
                    warnings += 1;
                    details.push("previous registry content could not be preserved".into());
                }
            }
            Err(e) => return StageReport::failed(Stage::Reconcile, e.to_string()),
        }

        if let Some(settings_path) = &self.plan.settings_path {
            if self.plan.settings_entries.is_empty() {
                warn!("settings target declared but no settings entries configured");
            } else {
                match self
                    .reconciler
                    .reconcile_settings(settings_path, &self.plan.settings_entries)
                {
                    Ok(result) => {
                        if let Some(backup) = &result.backup {
                            details.push(format!("backup: {}", backup.backup_path.display()));
                        }
                        if result.lossy {
                            warnings += 1;
                            details.push("previous settings content could not be preserved".into());
                        }
                    }
                    Err(e) => return StageReport::failed(Stage::Reconcile, e.to_string()),
                }
            }
        }

        let mut report = if warnings > 0 {
            StageReport::degraded(Stage::Reconcile, warnings, details.join("; "))
        } else {
            StageReport::passed(Stage::Reconcile)
        };
        if !details.is_empty() {
            report = report.with_detail(details.join("; "));
        }
        report
    }
}
