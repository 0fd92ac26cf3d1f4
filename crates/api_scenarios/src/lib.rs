//! Scenario suite for the panel API.
//!
//! A [`TestContext`] holds the configured clients and the shared cleanup
//! registry. The [`ScenarioRunner`] runs the [`Scenario`] catalogue against
//! it one scenario at a time, turns errors and panics into failed
//! [`Outcome`]s, and drains the registry at teardown. The `panel-api-tests`
//! binary wires this to the command line.

pub mod context;
pub use context::TestContext;

pub mod report;
pub use report::{generate_test_report, render_report};

pub mod runner;
pub use runner::{RunSummary, ScenarioRunner};

pub mod scenario;
pub use scenario::{Outcome, Scenario, ScenarioGroup, ScenarioResult};

pub mod scenarios;

/// Initialize logging for the runner binary.
///
/// Defaults to `info` when `RUST_LOG` is unset. `json` switches to one JSON
/// object per line for log collectors.
pub fn init_logging(json: bool) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
