//! Pipeline state machine types.
//!
//! The deployment pipeline is strictly forward-moving: each state is
//! reached at most once per run, and the only branch is the terminal
//! [`PipelineState::Failed`], which records the stage it occurred in.

use serde::{Deserialize, Serialize};

/// One stage of the deployment pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// TLS bundle provisioning.
    Certificates,
    /// External image build.
    Build,
    /// External service start.
    Deploy,
    /// Endpoint health verification.
    Verify,
    /// Configuration reconciliation.
    Reconcile,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 5] = [
        Stage::Certificates,
        Stage::Build,
        Stage::Deploy,
        Stage::Verify,
        Stage::Reconcile,
    ];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Certificates => "certificates",
            Stage::Build => "build",
            Stage::Deploy => "deploy",
            Stage::Verify => "verify",
            Stage::Reconcile => "reconcile",
        };
        write!(f, "{}", name)
    }
}

/// State of the deployment pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PipelineState {
    /// No stage has run yet.
    NotStarted,
    /// TLS bundle present and valid.
    CertificatesReady,
    /// External build finished (or was skipped).
    Built,
    /// Services started by the external runner.
    Deployed,
    /// Health verification finished (possibly degraded).
    Verified,
    /// Configuration reconciliation finished (or was skipped).
    ConfigReconciled,
    /// All stages done.
    Complete,
    /// Terminal failure, recording where it happened.
    Failed {
        /// Stage the failure occurred in.
        stage: Stage,
        /// Human-readable cause.
        reason: String,
    },
}

impl PipelineState {
    /// Ordinal used to enforce forward-only transitions.
    fn ordinal(&self) -> u8 {
        match self {
            PipelineState::NotStarted => 0,
            PipelineState::CertificatesReady => 1,
            PipelineState::Built => 2,
            PipelineState::Deployed => 3,
            PipelineState::Verified => 4,
            PipelineState::ConfigReconciled => 5,
            PipelineState::Complete => 6,
            PipelineState::Failed { .. } => 7,
        }
    }

    /// Whether this state can legally follow `self`.
    pub fn can_advance_to(&self, next: &PipelineState) -> bool {
        if matches!(self, PipelineState::Complete | PipelineState::Failed { .. }) {
            return false;
        }
        matches!(next, PipelineState::Failed { .. }) || next.ordinal() > self.ordinal()
    }

    /// Whether the pipeline has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Complete | PipelineState::Failed { .. })
    }

    /// Whether the pipeline ended in failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, PipelineState::Failed { .. })
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::NotStarted => write!(f, "not started"),
            PipelineState::CertificatesReady => write!(f, "certificates ready"),
            PipelineState::Built => write!(f, "built"),
            PipelineState::Deployed => write!(f, "deployed"),
            PipelineState::Verified => write!(f, "verified"),
            PipelineState::ConfigReconciled => write!(f, "config reconciled"),
            PipelineState::Complete => write!(f, "complete"),
            PipelineState::Failed { stage, reason } => {
                write!(f, "failed at {}: {}", stage, reason)
            }
        }
    }
}
