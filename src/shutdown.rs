// src/shutdown.rs

//! Graceful shutdown on SIGINT / SIGTERM.
//!
//! The first signal takes a one-time shutdown lock, stops every supervisor
//! from spawning, terminates the running ones (each on its own escalation
//! ladder, one after the other), waits briefly so buffered output reaches
//! the sink, and exits the process with status 0. Signals racing in while that is under way wait on
//! the lock and then do nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::exec::Supervisor;
use crate::output::OutputSink;

/// Time given to the output mux to drain after children are gone.
pub const DEFAULT_FLUSH_GRACE: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct ShutdownCoordinator {
    supervisors: Vec<Arc<Supervisor>>,
    sink: OutputSink,
    flush_grace: Duration,
    /// Set once shutdown has run.
    shutdown: Mutex<bool>,
}

impl ShutdownCoordinator {
    pub fn new(supervisors: Vec<Arc<Supervisor>>, sink: OutputSink, flush_grace: Duration) -> Self {
        Self {
            supervisors,
            sink,
            flush_grace,
            shutdown: Mutex::new(false),
        }
    }

    /// Terminate all running supervisors and wait for output to flush.
    ///
    /// Returns `true` for the call that performed the shutdown and `false`
    /// for every later (or concurrent) call.
    pub async fn shutdown(&self, reason: &str) -> bool {
        let mut done = self.shutdown.lock().await;
        if *done {
            return false;
        }
        *done = true;

        info!(reason = %reason, "shutting down");
        self.sink.info(reason).await;

        // A change queued behind a terminating child must not start another.
        for supervisor in &self.supervisors {
            supervisor.stop_spawning();
        }
        for supervisor in &self.supervisors {
            supervisor.terminate().await;
        }

        tokio::time::sleep(self.flush_grace).await;
        true
    }

    /// Subscribe to SIGINT and SIGTERM and exit the process after the first
    /// one has been handled.
    pub fn install(self: Arc<Self>) -> std::io::Result<JoinHandle<()>> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            Ok(tokio::spawn(async move {
                let name = tokio::select! {
                    _ = sigint.recv() => "interrupt",
                    _ = sigterm.recv() => "terminated",
                };
                self.handle_signal(name).await;
            }))
        }

        #[cfg(not(unix))]
        {
            Ok(tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    self.handle_signal("interrupt").await;
                }
            }))
        }
    }

    async fn handle_signal(&self, name: &str) {
        let reason = format!("Interrupted ({name}). Cleaning up children...");
        if self.shutdown(&reason).await {
            std::process::exit(0);
        }
    }
}
