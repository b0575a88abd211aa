//! Console output helpers.

use colored::Colorize;

use slipway_types::{RunReport, StageOutcome};

/// Print a success status line.
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning status line.
pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow().bold(), message);
}

/// Print an error status line.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

fn outcome_label(outcome: StageOutcome) -> colored::ColoredString {
    match outcome {
        StageOutcome::Passed => "passed".green(),
        StageOutcome::Skipped => "skipped".dimmed(),
        StageOutcome::Degraded => "degraded".yellow(),
        StageOutcome::Failed => "failed".red().bold(),
    }
}

/// Print the final per-stage summary for a run.
pub fn print_summary(report: &RunReport) {
    println!();
    println!("{}", "Deployment summary".bold());
    for stage in &report.stages {
        let mut line = format!("  {:<14} {}", stage.stage.to_string(), outcome_label(stage.outcome));
        if let Some(detail) = &stage.detail {
            line.push_str(&format!("  ({})", detail));
        }
        println!("{}", line);
    }

    println!();
    if report.succeeded() {
        if report.warnings() > 0 {
            print_warning(&format!(
                "completed with {} warning(s)",
                report.warnings()
            ));
        } else {
            print_success("deployment complete");
        }
    } else {
        print_error(&format!("deployment {}", report.final_state));
    }
}
