//! Run finalization.
//!
//! Orders the collected reports, tallies outcomes and logs the run summary
//! and infrastructure error counts.

use std::time::Instant;

use log::info;
use serde::Serialize;

use crate::checks::{CheckOutcome, CheckReport};
use crate::error_handling::ProcessingStats;

use super::RunReport;

/// Counts of checks per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[CheckReport]) -> Self {
        let mut summary = RunSummary {
            total: reports.len(),
            ..Default::default()
        };
        for report in reports {
            match report.outcome {
                CheckOutcome::Passed => summary.passed += 1,
                CheckOutcome::Failed => summary.failed += 1,
                CheckOutcome::Skipped => summary.skipped += 1,
                CheckOutcome::Errored => summary.errored += 1,
            }
        }
        summary
    }
}

/// Finalize a run and produce the report.
///
/// `slots` holds one entry per configured check in document order; an empty
/// slot would mean a task vanished without reporting and is dropped.
pub fn finalize_run(
    slots: Vec<Option<CheckReport>>,
    stats: &ProcessingStats,
    started: Instant,
) -> RunReport {
    let checks: Vec<CheckReport> = slots.into_iter().flatten().collect();
    let summary = RunSummary::from_reports(&checks);
    let elapsed_seconds = started.elapsed().as_secs_f64();

    print_error_statistics(stats);
    info!(
        "Ran {} check{} ({} passed, {} failed, {} skipped, {} errored) in {:.1}s",
        summary.total,
        if summary.total == 1 { "" } else { "s" },
        summary.passed,
        summary.failed,
        summary.skipped,
        summary.errored,
        elapsed_seconds
    );

    RunReport {
        checks,
        summary,
        elapsed_seconds,
        infrastructure_errors: stats.non_zero(),
    }
}

/// Logs infrastructure error counts, if any.
fn print_error_statistics(stats: &ProcessingStats) {
    let total_errors = stats.total_errors();
    if total_errors == 0 {
        return;
    }
    info!("Error Counts ({} total):", total_errors);
    for (error_type, count) in stats.non_zero() {
        info!("   {}: {}", error_type.as_str(), count);
    }
}
