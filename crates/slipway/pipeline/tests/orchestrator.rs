//! Orchestrator state machine tests with a scripted runner.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use slipway_certs::CertificateStore;
use slipway_health::{Backoff, HealthVerifier, RetryPolicy};
use slipway_pipeline::{
    ComposeRunner, DeploymentOrchestrator, DeploymentPlan, RunOptions, RunnerError, RunnerResult,
};
use slipway_reconcile::{ConfigReconciler, ReconcileOptions};
use slipway_types::{EndpointProbe, PipelineState, Stage, StageOutcome};

/// Runner that records calls and fails on demand.
#[derive(Default)]
struct ScriptedRunner {
    calls: Mutex<Vec<&'static str>>,
    fail_build: AtomicBool,
    fail_up: AtomicBool,
}

impl ScriptedRunner {
    fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComposeRunner for ScriptedRunner {
    async fn build(&self) -> RunnerResult<()> {
        self.calls.lock().unwrap().push("build");
        if self.fail_build.load(Ordering::SeqCst) {
            return Err(RunnerError::NonZeroExit {
                command: "docker compose build".into(),
                code: Some(1),
            });
        }
        Ok(())
    }

    async fn up(&self) -> RunnerResult<()> {
        self.calls.lock().unwrap().push("up");
        if self.fail_up.load(Ordering::SeqCst) {
            return Err(RunnerError::NonZeroExit {
                command: "docker compose up -d".into(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    runner: Arc<ScriptedRunner>,
    registry_path: PathBuf,
}

impl Harness {
    fn new(probes: Vec<EndpointProbe>, options: RunOptions) -> (Self, DeploymentOrchestrator) {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::default());
        let registry_path = dir.path().join("mcp.json");

        let plan = DeploymentPlan {
            subject: "localhost".into(),
            descriptor: slipway_types::ServiceDescriptor::http("svc", "https://localhost/mcp"),
            registry_path: registry_path.clone(),
            settings_path: None,
            settings_entries: serde_json::Map::new(),
            probes,
        };

        let orchestrator = DeploymentOrchestrator::new(
            CertificateStore::new(dir.path().join("certs")),
            runner.clone(),
            HealthVerifier::new(RetryPolicy {
                max_attempts: 2,
                backoff: Backoff::Fixed(Duration::from_millis(1)),
            })
            .unwrap(),
            ConfigReconciler::new(ReconcileOptions::default()),
            plan,
            options,
        );

        (
            Harness {
                _dir: dir,
                runner,
                registry_path,
            },
            orchestrator,
        )
    }
}

#[tokio::test]
async fn test_full_run_reaches_complete() {
    let (harness, mut orchestrator) = Harness::new(vec![], RunOptions::default());

    let report = orchestrator.run().await;

    assert_eq!(report.final_state, PipelineState::Complete);
    assert!(report.succeeded());
    assert_eq!(harness.runner.calls(), vec!["build", "up"]);
    assert!(harness.registry_path.exists());
}

#[tokio::test]
async fn test_skip_flags_no_op_their_stages() {
    let (harness, mut orchestrator) = Harness::new(
        vec![],
        RunOptions {
            skip_build: true,
            skip_config: true,
        },
    );

    let report = orchestrator.run().await;

    assert_eq!(report.final_state, PipelineState::Complete);
    assert_eq!(report.stage(Stage::Build).unwrap().outcome, StageOutcome::Skipped);
    assert_eq!(
        report.stage(Stage::Reconcile).unwrap().outcome,
        StageOutcome::Skipped
    );
    assert_eq!(harness.runner.calls(), vec!["up"]);
    assert!(!harness.registry_path.exists());
}

#[tokio::test]
async fn test_build_failure_halts_before_deploy() {
    let (harness, mut orchestrator) = Harness::new(vec![], RunOptions::default());
    harness.runner.fail_build.store(true, Ordering::SeqCst);

    let report = orchestrator.run().await;

    assert!(matches!(
        report.final_state,
        PipelineState::Failed {
            stage: Stage::Build,
            ..
        }
    ));
    assert_eq!(harness.runner.calls(), vec!["build"]);
    assert!(report.stage(Stage::Deploy).is_none());
    assert!(!harness.registry_path.exists());
}

#[tokio::test]
async fn test_deploy_failure_halts_before_reconcile() {
    let (harness, mut orchestrator) = Harness::new(vec![], RunOptions::default());
    harness.runner.fail_up.store(true, Ordering::SeqCst);

    let report = orchestrator.run().await;

    assert!(matches!(
        report.final_state,
        PipelineState::Failed {
            stage: Stage::Deploy,
            ..
        }
    ));
    assert!(report.stage(Stage::Verify).is_none());
    assert!(!harness.registry_path.exists());
}

#[tokio::test]
async fn test_degraded_health_still_reconciles() {
    // Nothing listens on this address: the probe ends in `error`.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let probe = EndpointProbe::new(format!("http://{}/health", addr), "healthy");
    let (harness, mut orchestrator) = Harness::new(vec![probe], RunOptions::default());

    let report = orchestrator.run().await;

    assert_eq!(report.final_state, PipelineState::Complete);
    assert_eq!(
        report.stage(Stage::Verify).unwrap().outcome,
        StageOutcome::Degraded
    );
    assert!(report.warnings() > 0);
    // The config entry landed despite the degraded verification.
    assert!(harness.registry_path.exists());
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let (harness, mut orchestrator) = Harness::new(vec![], RunOptions::default());

    let first = orchestrator.run().await;
    assert_eq!(first.final_state, PipelineState::Complete);
    let registry_after_first = std::fs::read_to_string(&harness.registry_path).unwrap();
    let cert_after_first =
        std::fs::read(harness._dir.path().join("certs").join("cert.pem")).unwrap();

    let second = orchestrator.run().await;
    assert_eq!(second.final_state, PipelineState::Complete);
    assert_eq!(
        std::fs::read_to_string(&harness.registry_path).unwrap(),
        registry_after_first
    );
    assert_eq!(
        std::fs::read(harness._dir.path().join("certs").join("cert.pem")).unwrap(),
        cert_after_first
    );
}
