//! Scenario runner for the panel API.
//!
//! Runs the client, application and WebSocket scenarios against a live panel,
//! deletes everything the scenarios created, and exits non-zero when any
//! scenario failed.
//!
//! ## Usage
//!
//! ```bash
//! # Run every scenario
//! cargo run --bin panel-api-tests
//!
//! # Only the client and WebSocket groups, with a Markdown report
//! cargo run --bin panel-api-tests -- --group client --group websocket --report report.md
//!
//! # Sweep resources left by aborted runs, then exit
//! cargo run --bin panel-api-tests -- --cleanup-only
//! ```
//!
//! ## Environment Variables
//!
//! Read from the environment or `.env.test`:
//! - `PTERODACTYL_URL`: panel base URL
//! - `CLIENT_API_KEY`: client API key (`ptlc_`)
//! - `APPLICATION_API_KEY`: optional application API key (`ptla_`)
//! - `SAFE_MODE` / `DEMO_MODE` / `SKIP_DESTRUCTIVE`: run-mode flags

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use api_scenarios::{
    RunSummary, ScenarioGroup, ScenarioRunner, TestContext, generate_test_report, init_logging,
};
use clap::Parser;
use panel_config::ConfigurationSnapshot;
use test_cleanup::{CleanupRegistry, OrphanSweeper, install_signal_handlers};
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "panel-api-tests",
    version,
    about = "Functional tests for the panel REST and WebSocket APIs"
)]
struct Args {
    /// Scenario group to run; repeat for several. Runs every group when omitted.
    #[arg(long = "group", value_enum)]
    groups: Vec<ScenarioGroup>,

    /// Write a Markdown report to this path
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Delete resources left by earlier aborted runs before running scenarios
    #[arg(long)]
    cleanup_orphans: bool,

    /// Only delete resources left by earlier runs; run no scenarios
    #[arg(long)]
    cleanup_only: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log_json);

    match run(args).await {
        Ok(0) => info!("All scenarios passed"),
        Ok(code) => process::exit(code),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Test run aborted");
            process::exit(1);
        }
    }
}

/// Returns the exit code: 0 when every scenario passed or was skipped, 1 on
/// failures, the signal's code when the run was interrupted.
async fn run(args: Args) -> Result<i32> {
    info!("Starting panel API scenarios");

    let config = Arc::new(
        ConfigurationSnapshot::load().context("Failed to load test configuration")?,
    );
    config.log_summary();

    let registry = Arc::new(
        CleanupRegistry::from_config(&config).context("Failed to create cleanup registry")?,
    );
    let shutdown = install_signal_handlers(Arc::clone(&registry));

    if args.cleanup_orphans || args.cleanup_only {
        sweep_orphans(&config).await;
    }
    if args.cleanup_only {
        info!("Cleanup completed, exiting as requested");
        return Ok(0);
    }

    let ctx = TestContext::new(Arc::clone(&config), registry)
        .context("Failed to create API clients")?;
    let runner = ScenarioRunner::new(ctx, args.groups).with_shutdown(shutdown);

    runner.preflight().await?;
    let results = runner.run_all().await;
    let cleanup = runner.teardown().await;

    if let Some(path) = &args.report {
        generate_test_report(&results, &cleanup, path)?;
    }

    if let Some(signal) = runner.shutdown_requested() {
        warn!(signal = ?signal, "Run interrupted");
        return Ok(signal.exit_code());
    }

    let summary = RunSummary::from_results(&results);
    if !summary.succeeded() {
        error!(
            failed = summary.failed,
            total = summary.total,
            "Scenario suite failed"
        );
        return Ok(1);
    }
    Ok(0)
}

/// Sweep orphans; failures are logged and never stop the run.
async fn sweep_orphans(config: &ConfigurationSnapshot) {
    info!("Starting orphaned resource cleanup");

    let sweeper = match OrphanSweeper::from_config(config) {
        Ok(sweeper) => sweeper,
        Err(e) => {
            warn!(error = %e, "Skipping orphaned resource cleanup");
            return;
        }
    };

    match sweeper.sweep(false).await {
        Ok(report) if report.found() == 0 => info!("No orphaned resources found"),
        Ok(report) => info!(
            api_keys = ?report.api_keys,
            users = ?report.users,
            deleted = report.cleanup.deleted,
            failed = report.cleanup.failed,
            "Cleaned up orphaned resources"
        ),
        Err(e) => warn!(error = %e, "Failed to clean up orphaned resources"),
    }
}
