// src/engine/reflex.rs

//! A reflex: one matcher, one debouncer, one supervisor, wired together.

use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::config::CommandSettings;
use crate::engine::debounce::Debouncer;
use crate::engine::filter::filter_matching;
use crate::engine::handoff;
use crate::errors::Result;
use crate::exec::{Supervisor, SupervisorOptions, TerminalBackend};
use crate::output::OutputSink;
use crate::watch::{Matcher, RegexMatcher};

/// A single watch + command.
///
/// Changes flow `filter → debounce → dispatch`, each stage its own task:
///
/// ```text
/// changes ──▶ filter_matching ──▶ Debouncer ══handoff══▶ Supervisor::run_dispatch
/// ```
#[derive(Debug)]
pub struct Reflex {
    matcher: Arc<dyn Matcher>,
    supervisor: Arc<Supervisor>,
    quiet_interval: Duration,
}

impl Reflex {
    pub fn new(
        matcher: Arc<dyn Matcher>,
        supervisor: Arc<Supervisor>,
        quiet_interval: Duration,
    ) -> Self {
        Self {
            matcher,
            supervisor,
            quiet_interval,
        }
    }

    /// Build a reflex from validated settings. Fails if the pattern does not
    /// compile.
    pub fn from_settings(
        id: u32,
        settings: &CommandSettings,
        backend: Arc<dyn TerminalBackend>,
        sink: OutputSink,
    ) -> Result<Self> {
        let matcher = RegexMatcher::new(&settings.regex, settings.inverse)?;
        let options = SupervisorOptions {
            source: settings.source.clone(),
            mode: settings.mode,
            shutdown_timeout: settings.shutdown_timeout,
            ..SupervisorOptions::new(id, settings.argv.clone())
        };
        let supervisor = Supervisor::new(options, backend, sink);
        Ok(Self::new(
            Arc::new(matcher),
            Arc::new(supervisor),
            settings.quiet_interval,
        ))
    }

    pub fn matcher(&self) -> Arc<dyn Matcher> {
        Arc::clone(&self.matcher)
    }

    pub fn supervisor(&self) -> Arc<Supervisor> {
        Arc::clone(&self.supervisor)
    }

    /// Human-readable summary, as printed by `--dry-run`.
    pub fn describe(&self) -> String {
        let mut buf = String::new();
        let _ = writeln!(buf, "Reflex from {}", self.supervisor.source());
        let _ = writeln!(buf, "| ID: {}", self.supervisor.id());
        for line in self.matcher.to_string().lines() {
            let _ = writeln!(buf, "| {line}");
        }
        let _ = writeln!(buf, "| Command: {:?}", self.supervisor.argv());
        let _ = writeln!(buf, "+---------");
        buf
    }

    /// Spawn the pipeline stages consuming `changes`.
    ///
    /// In service mode the command is started once right away, before any
    /// change arrives.
    pub fn start(&self, changes: mpsc::Receiver<String>) -> ReflexHandle {
        let (filtered_tx, filtered_rx) = mpsc::channel(1);
        let (giver, taker) = handoff::channel();

        debug!(supervisor = self.supervisor.id(), "starting reflex pipeline");

        let tasks = vec![
            tokio::spawn(filter_matching(self.matcher(), changes, filtered_tx)),
            tokio::spawn(Debouncer::new(self.quiet_interval).run(filtered_rx, giver)),
            tokio::spawn(self.supervisor().run_dispatch(taker)),
        ];

        ReflexHandle { tasks }
    }
}

/// Handle on a running reflex pipeline.
#[derive(Debug)]
pub struct ReflexHandle {
    tasks: Vec<JoinHandle<()>>,
}

impl ReflexHandle {
    /// Abort every stage. Does not terminate a live child; use
    /// [`Supervisor::terminate`] for that.
    pub fn abort(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }

    /// Wait for all stages to finish (they finish once the change stream
    /// closes and the last dispatch completes).
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}
