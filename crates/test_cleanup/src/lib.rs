//! Cleanup of resources created on the panel by test runs.
//!
//! Scenarios register what they create with a [`CleanupRegistry`]; the runner
//! drains it at teardown, and [`install_signal_handlers`] drains it when the
//! run is interrupted. Resources left by runs that never reached either are
//! found by name with the [`OrphanSweeper`] (binary `cleanup-orphans`).

pub mod orphans;
pub use orphans::{OrphanSweeper, SweepReport};

pub mod registry;
pub use registry::{CleanupRegistry, CleanupSummary, ResourceKind, TrackedResource};

pub mod signals;
pub use signals::{
    SHUTDOWN_GRACE, ShutdownNotice, ShutdownSignal, handle_shutdown, install_signal_handlers,
    request_shutdown,
};

/// Initialize logging for cleanup operations.
///
/// Sets up tracing with appropriate formatting for CLI use. Defaults to
/// `info` when `RUST_LOG` is unset.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}
