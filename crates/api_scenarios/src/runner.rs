//! Sequential scenario runner.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use anyhow::{Result, bail};
use futures_util::FutureExt;
use panel_client::{ApiClient, with_retry};
use test_cleanup::{CleanupSummary, ShutdownNotice, ShutdownSignal};
use tracing::{error, info, warn};

use crate::{Outcome, Scenario, ScenarioGroup, ScenarioResult, TestContext};

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;

/// Path requested to check the client API is reachable.
const CLIENT_CHECK_PATH: &str = "/api/client";
const APPLICATION_CHECK_PATH: &str = "/api/application/users";

/// Counts over a set of results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn from_results(results: &[ScenarioResult]) -> Self {
        results.iter().fold(
            RunSummary {
                total: results.len(),
                ..Default::default()
            },
            |mut summary, result| {
                match result.outcome {
                    Outcome::Passed => summary.passed += 1,
                    Outcome::Skipped(_) => summary.skipped += 1,
                    Outcome::Failed(_) => summary.failed += 1,
                }
                summary
            },
        )
    }

    pub fn succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Runs the selected scenarios against one [`TestContext`].
pub struct ScenarioRunner {
    ctx: TestContext,
    groups: Vec<ScenarioGroup>,
    shutdown: Option<ShutdownNotice>,
}

impl ScenarioRunner {
    /// Runner for `groups`; an empty list runs every group.
    pub fn new(ctx: TestContext, groups: Vec<ScenarioGroup>) -> Self {
        Self {
            ctx,
            groups,
            shutdown: None,
        }
    }

    /// Stop before the next scenario once `notice` is raised.
    pub fn with_shutdown(mut self, notice: ShutdownNotice) -> Self {
        self.shutdown = Some(notice);
        self
    }

    pub fn shutdown_requested(&self) -> Option<ShutdownSignal> {
        self.shutdown.as_ref().and_then(ShutdownNotice::requested)
    }

    pub fn context(&self) -> &TestContext {
        &self.ctx
    }

    /// Scenarios this runner will execute, in order.
    pub fn scenarios(&self) -> Vec<Scenario> {
        Scenario::selected(&self.groups)
    }

    /// Check both APIs answer before any scenario runs.
    ///
    /// # Errors
    ///
    /// Fails when the client API is unreachable, except in safe mode where
    /// the failure is only logged. An unreachable application API never
    /// fails the preflight.
    pub async fn preflight(&self) -> Result<()> {
        info!("Checking API connectivity");

        let attempts = self.ctx.config().retry_attempts();

        if check_reachable(self.ctx.client(), CLIENT_CHECK_PATH, attempts).await {
            info!("Client API reachable");
        } else if self.ctx.config().safe_mode() {
            warn!("Client API connection failed; continuing in safe mode");
        } else {
            bail!("Client API connection failed");
        }

        if let Some(application) = self.ctx.application() {
            if check_reachable(application, APPLICATION_CHECK_PATH, attempts).await {
                info!("Application API reachable");
            } else {
                warn!("Application API connection failed; application scenarios will likely fail");
            }
        }

        Ok(())
    }

    /// Run every selected scenario in order, stopping early on shutdown.
    pub async fn run_all(&self) -> Vec<ScenarioResult> {
        let scenarios = self.scenarios();
        let count = scenarios.len();
        info!(count, "Starting scenario suite");

        let mut results = Vec::with_capacity(count);
        for scenario in scenarios {
            if let Some(signal) = self.shutdown_requested() {
                warn!(
                    signal = ?signal,
                    remaining = count - results.len(),
                    "Shutdown requested, not running remaining scenarios"
                );
                break;
            }
            results.push(self.run_single(scenario).await);
        }

        let summary = RunSummary::from_results(&results);
        info!(
            total = summary.total,
            passed = summary.passed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Scenario suite completed"
        );

        results
    }

    /// Run one scenario. Errors and panics in the body become failures.
    pub async fn run_single(&self, scenario: Scenario) -> ScenarioResult {
        let start_time = Instant::now();

        let outcome = match AssertUnwindSafe(scenario.run(&self.ctx))
            .catch_unwind()
            .await
        {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Outcome::Failed(format!("{e:#}")),
            Err(panic) => Outcome::Failed(format!("panicked: {}", panic_message(panic.as_ref()))),
        };
        let duration = start_time.elapsed();
        let duration_ms = duration.as_millis() as u64;

        match &outcome {
            Outcome::Passed => info!(
                scenario = %scenario,
                group = %scenario.group(),
                duration_ms,
                "PASS"
            ),
            Outcome::Skipped(reason) => info!(
                scenario = %scenario,
                group = %scenario.group(),
                duration_ms,
                reason = %reason,
                "SKIP"
            ),
            Outcome::Failed(reason) => error!(
                scenario = %scenario,
                group = %scenario.group(),
                duration_ms,
                error = %reason,
                "FAIL"
            ),
        }

        ScenarioResult {
            scenario,
            outcome,
            duration,
        }
    }

    /// Delete everything the scenarios registered and log the totals.
    pub async fn teardown(&self) -> CleanupSummary {
        info!("Cleaning up resources created during this run");
        let cleanup = self.ctx.registry().drain_all().await;

        if cleanup.is_clean() {
            info!(
                attempted = cleanup.attempted,
                deleted = cleanup.deleted,
                "Cleanup summary"
            );
        } else {
            warn!(
                attempted = cleanup.attempted,
                deleted = cleanup.deleted,
                failed = cleanup.failed,
                "Cleanup summary; some resources were not deleted"
            );
        }

        cleanup
    }
}

/// `test_connection` retried with backoff, up to `attempts` times.
async fn check_reachable(api: &ApiClient, path: &str, attempts: u32) -> bool {
    with_retry(
        || async {
            if api.test_connection(path).await {
                Ok(())
            } else {
                Err(format!("{path} unreachable"))
            }
        },
        attempts,
    )
    .await
    .is_ok()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}
