//! Markdown report of a run, for CI artifacts.

use std::fmt::{self, Write as _};
use std::path::Path;

use anyhow::{Context, Result};
use test_cleanup::CleanupSummary;
use tracing::info;

use crate::{Outcome, RunSummary, ScenarioResult};

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;

/// Render the report for `results` and the teardown `cleanup`.
pub fn render_report(results: &[ScenarioResult], cleanup: &CleanupSummary) -> Result<String> {
    let mut report = String::new();
    write_report(&mut report, results, cleanup)?;
    Ok(report)
}

fn write_report(
    report: &mut String,
    results: &[ScenarioResult],
    cleanup: &CleanupSummary,
) -> fmt::Result {
    let summary = RunSummary::from_results(results);
    let total_duration: f64 = results.iter().map(|r| r.duration.as_secs_f64()).sum();

    writeln!(report, "# Panel API Test Report")?;
    writeln!(report)?;
    writeln!(
        report,
        "Generated: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(report)?;

    writeln!(report, "## Summary")?;
    writeln!(report)?;
    writeln!(report, "| Metric | Value |")?;
    writeln!(report, "|--------|-------|")?;
    writeln!(report, "| Total Scenarios | {} |", summary.total)?;
    writeln!(report, "| Passed | {} |", summary.passed)?;
    writeln!(report, "| Skipped | {} |", summary.skipped)?;
    writeln!(report, "| Failed | {} |", summary.failed)?;
    writeln!(report, "| Total Duration | {total_duration:.2}s |")?;
    writeln!(
        report,
        "| Cleanup | {} of {} deleted |",
        cleanup.deleted, cleanup.attempted
    )?;
    writeln!(report)?;

    writeln!(report, "## Scenario Results")?;
    writeln!(report)?;

    for result in results {
        let (emoji, status) = match result.outcome {
            Outcome::Passed => ("✅", "PASSED"),
            Outcome::Skipped(_) => ("⏭️", "SKIPPED"),
            Outcome::Failed(_) => ("❌", "FAILED"),
        };

        writeln!(report, "### {emoji} {}", result.scenario)?;
        writeln!(report)?;
        writeln!(report, "- **Status**: {status}")?;
        writeln!(
            report,
            "- **Duration**: {:.2}s",
            result.duration.as_secs_f64()
        )?;
        match &result.outcome {
            Outcome::Skipped(reason) => writeln!(report, "- **Reason**: {reason}")?,
            Outcome::Failed(error) => writeln!(report, "- **Error**: {error}")?,
            Outcome::Passed => {}
        }
        writeln!(report)?;
    }

    Ok(())
}

/// Write the report to `path`.
pub fn generate_test_report(
    results: &[ScenarioResult],
    cleanup: &CleanupSummary,
    path: &Path,
) -> Result<()> {
    std::fs::write(path, render_report(results, cleanup)?)
        .with_context(|| format!("Failed to write test report to {}", path.display()))?;
    info!(path = %path.display(), "Wrote test report");
    Ok(())
}
