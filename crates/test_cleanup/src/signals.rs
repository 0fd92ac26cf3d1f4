//! Cleanup on interrupt and terminate.
//!
//! A signal first raises a [`ShutdownNotice`] so the runner can stop between
//! scenarios and tear down itself. The registry is drained here only when
//! the runner has not exited within [`SHUTDOWN_GRACE`], or on a second
//! signal.

use std::{future::Future, process, sync::Arc, time::Duration};

use tokio::sync::watch;
use tracing::{error, warn};

use crate::CleanupRegistry;

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;

/// A signal that ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl ShutdownSignal {
    /// Conventional shell exit status: 128 plus the signal number.
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownSignal::Interrupt => 130,
            ShutdownSignal::Terminate => 143,
        }
    }
}

/// Time the runner gets to finish its current scenario and tear down.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(60);

/// Read side of the shutdown request raised by a signal.
#[derive(Debug, Clone)]
pub struct ShutdownNotice {
    receiver: watch::Receiver<Option<ShutdownSignal>>,
}

impl ShutdownNotice {
    /// A notice together with the sender that raises it.
    pub fn channel() -> (watch::Sender<Option<ShutdownSignal>>, Self) {
        let (sender, receiver) = watch::channel(None);
        (sender, Self { receiver })
    }

    /// The signal received so far, if any.
    pub fn requested(&self) -> Option<ShutdownSignal> {
        *self.receiver.borrow()
    }
}

/// Spawn the task that handles interrupt and terminate. Call once, at
/// startup, and hand the returned notice to the runner.
pub fn install_signal_handlers(registry: Arc<CleanupRegistry>) -> ShutdownNotice {
    let (sender, notice) = ShutdownNotice::channel();
    tokio::spawn(async move {
        let signal = wait_for_shutdown_signal().await;
        let code = request_shutdown(&registry, signal, &sender, wait_for_shutdown_signal()).await;
        process::exit(code);
    });
    notice
}

/// Raise the notice for `signal`, then drain once [`SHUTDOWN_GRACE`] has
/// passed or `force` completes. Returns the exit code to use.
///
/// Entries the runner already drained are gone by then, so nothing is
/// deleted twice.
pub async fn request_shutdown<F>(
    registry: &CleanupRegistry,
    signal: ShutdownSignal,
    sender: &watch::Sender<Option<ShutdownSignal>>,
    force: F,
) -> i32
where
    F: Future,
{
    warn!(signal = ?signal, "Received shutdown signal, stopping after the current scenario");
    sender.send_replace(Some(signal));

    tokio::select! {
        _ = tokio::time::sleep(SHUTDOWN_GRACE) => {
            warn!("Scenarios did not stop in time, cleaning up now");
        }
        _ = force => {
            warn!("Received second shutdown signal, cleaning up now");
        }
    }

    handle_shutdown(registry, signal).await
}

/// Drain the registry for `signal` and return the exit code to use.
pub async fn handle_shutdown(registry: &CleanupRegistry, signal: ShutdownSignal) -> i32 {
    warn!(signal = ?signal, "Received shutdown signal, cleaning up tracked resources");
    let summary = registry.drain_all().await;
    if !summary.is_clean() {
        warn!(
            failed = summary.failed,
            "Some resources could not be deleted during shutdown"
        );
    }
    signal.exit_code()
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> ShutdownSignal {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(e) => {
            error!(error = %e, "Failed to install SIGTERM handler");
            return wait_for_interrupt().await;
        }
    };

    tokio::select! {
        signal = wait_for_interrupt() => signal,
        _ = terminate.recv() => ShutdownSignal::Terminate,
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> ShutdownSignal {
    wait_for_interrupt().await
}

async fn wait_for_interrupt() -> ShutdownSignal {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to install interrupt handler");
        std::future::pending::<()>().await;
    }
    ShutdownSignal::Interrupt
}
