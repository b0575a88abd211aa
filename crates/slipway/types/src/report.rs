//! Stage and run reports.
//!
//! The original deploy scripts kept global error/warning counters; here
//! each stage returns an explicit [`StageReport`] and the orchestrator
//! folds them into one [`RunReport`] for the final summary. No
//! process-wide mutable state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::{PipelineState, Stage};

/// Outcome of a single pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// Stage ran and succeeded.
    Passed,
    /// Stage was skipped by an operator flag.
    Skipped,
    /// Stage ran but the result is degraded (non-fatal).
    Degraded,
    /// Stage failed.
    Failed,
}

impl std::fmt::Display for StageOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StageOutcome::Passed => "passed",
            StageOutcome::Skipped => "skipped",
            StageOutcome::Degraded => "degraded",
            StageOutcome::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Report for one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// Which stage this report covers.
    pub stage: Stage,

    /// How the stage ended.
    pub outcome: StageOutcome,

    /// Errors observed during the stage.
    pub errors: u32,

    /// Warnings observed during the stage.
    pub warnings: u32,

    /// Optional human-readable detail (failure cause, backup path, ...).
    pub detail: Option<String>,
}

impl StageReport {
    /// A passing report with no detail.
    pub fn passed(stage: Stage) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Passed,
            errors: 0,
            warnings: 0,
            detail: None,
        }
    }

    /// A skipped report.
    pub fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Skipped,
            errors: 0,
            warnings: 0,
            detail: None,
        }
    }

    /// A degraded report carrying a warning count and detail.
    pub fn degraded(stage: Stage, warnings: u32, detail: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Degraded,
            errors: 0,
            warnings,
            detail: Some(detail.into()),
        }
    }

    /// A failing report carrying the cause.
    pub fn failed(stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            stage,
            outcome: StageOutcome::Failed,
            errors: 1,
            warnings: 0,
            detail: Some(detail.into()),
        }
    }

    /// Attach detail to an existing report.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Aggregated report for a full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Per-stage reports in execution order.
    pub stages: Vec<StageReport>,

    /// Final pipeline state.
    pub final_state: PipelineState,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    /// Start an empty report.
    pub fn begin() -> Self {
        Self {
            stages: Vec::new(),
            final_state: PipelineState::NotStarted,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Record a stage report.
    pub fn record(&mut self, report: StageReport) {
        self.stages.push(report);
    }

    /// Close the report with the final state.
    pub fn finish(&mut self, state: PipelineState) {
        self.final_state = state;
        self.finished_at = Some(Utc::now());
    }

    /// Total errors across all stages.
    pub fn errors(&self) -> u32 {
        self.stages.iter().map(|s| s.errors).sum()
    }

    /// Total warnings across all stages.
    pub fn warnings(&self) -> u32 {
        self.stages.iter().map(|s| s.warnings).sum()
    }

    /// Whether the run completed without a failed stage.
    pub fn succeeded(&self) -> bool {
        !self.final_state.is_failed()
    }

    /// The report for a given stage, if it ran.
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_aggregation() {
        let mut report = RunReport::begin();
        report.record(StageReport::passed(Stage::Certificates));
        report.record(StageReport::degraded(Stage::Verify, 2, "1 of 2 endpoints down"));
        report.record(StageReport::failed(Stage::Reconcile, "write denied"));
        report.finish(PipelineState::Failed {
            stage: Stage::Reconcile,
            reason: "write denied".into(),
        });

        assert_eq!(report.errors(), 1);
        assert_eq!(report.warnings(), 2);
        assert!(!report.succeeded());
        assert_eq!(report.stage(Stage::Verify).unwrap().outcome, StageOutcome::Degraded);
    }
}
