// src/exec/supervisor.rs

//! Lifecycle of one external command.
//!
//! A [`Supervisor`] owns at most one live child at a time and moves through
//! `Idle → Starting → Running → Terminating → Stopped`. In service mode a new
//! trigger loops back to `Starting` after the old instance has fully
//! stopped; in one-shot mode every trigger runs the command to completion.
//!
//! The only thing that moves a child to `Stopped` is its wait completing.
//! That event is published once on a `watch` channel (the completion
//! signal), which any number of concurrent [`Supervisor::terminate`] calls
//! can observe.

use std::io::{BufRead, BufReader, Read};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::engine::handoff::Taker;
use crate::errors::SignalError;
use crate::exec::backend::{GroupSignal, ProcessControl, TermSize, TerminalBackend};
use crate::exec::resize::{current_terminal_size, spawn_resize_forwarder};
use crate::output::{OutputMessage, OutputSink};
use crate::types::SupervisorMode;

/// Default delay between escalation stages.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorPhase {
    Idle,
    Starting,
    Running,
    Terminating,
    Stopped,
}

/// Construction-time settings of a supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub id: u32,
    /// Describes what configured this supervisor, e.g. `[command line]`.
    pub source: String,
    pub mode: SupervisorMode,
    pub argv: Vec<String>,
    pub shutdown_timeout: Duration,
    /// Where the size applied to a child's terminal comes from.
    pub terminal_size: fn() -> Option<TermSize>,
}

impl SupervisorOptions {
    pub fn new(id: u32, argv: Vec<String>) -> Self {
        Self {
            id,
            source: "[command line]".to_string(),
            mode: SupervisorMode::default(),
            argv,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            terminal_size: current_terminal_size,
        }
    }
}

struct LiveProcess {
    control: Arc<dyn ProcessControl>,
    done: watch::Receiver<bool>,
}

struct SupervisorState {
    phase: SupervisorPhase,
    killed: bool,
    running: bool,
    /// Once set, no new child is spawned.
    shutting_down: bool,
    live: Option<LiveProcess>,
}

pub struct Supervisor {
    options: SupervisorOptions,
    backend: Arc<dyn TerminalBackend>,
    sink: OutputSink,
    /// Held only across reads/writes of the fields, never across I/O.
    state: Arc<Mutex<SupervisorState>>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor")
            .field("id", &self.options.id)
            .field("mode", &self.options.mode)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(
        options: SupervisorOptions,
        backend: Arc<dyn TerminalBackend>,
        sink: OutputSink,
    ) -> Self {
        Self {
            options,
            backend,
            sink,
            state: Arc::new(Mutex::new(SupervisorState {
                phase: SupervisorPhase::Idle,
                killed: false,
                running: false,
                shutting_down: false,
                live: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SupervisorState> {
        lock_state(&self.state)
    }

    pub fn id(&self) -> u32 {
        self.options.id
    }

    pub fn source(&self) -> &str {
        &self.options.source
    }

    pub fn mode(&self) -> SupervisorMode {
        self.options.mode
    }

    pub fn argv(&self) -> &[String] {
        &self.options.argv
    }

    pub fn phase(&self) -> SupervisorPhase {
        self.state().phase
    }

    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Whether the current (or last) child was terminated on purpose.
    pub fn killed(&self) -> bool {
        self.state().killed
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state().shutting_down
    }

    /// Refuse every later spawn. A child already being spawned is
    /// terminated as soon as it is registered; the live one is left to
    /// [`Supervisor::terminate`].
    pub fn stop_spawning(&self) {
        self.state().shutting_down = true;
    }

    async fn info(&self, text: impl Into<String>) {
        self.sink
            .send(OutputMessage::supervisor(self.options.id, text))
            .await;
    }

    /// Handle one dispatched change.
    ///
    /// - Service mode: stop the running instance (waiting until it is fully
    ///   stopped) and start a replacement.
    /// - One-shot mode: run the command and wait for it to finish.
    ///
    /// Spawn failures are reported on the output sink and leave the
    /// supervisor idle; the trigger is not retried.
    pub async fn start(&self, trigger: &str) {
        match self.options.mode {
            SupervisorMode::Service => {
                if self.is_running() {
                    self.info("Killing service").await;
                    self.terminate().await;
                }
                if self.is_shutting_down() {
                    return;
                }
                self.info("Starting service").await;
                self.spawn(trigger).await;
            }
            SupervisorMode::Once => {
                if let Some(mut done) = self.spawn(trigger).await {
                    wait_finished(&mut done).await;
                }
            }
        }
    }

    /// Spawn the command and wire up output, resize and wait handling.
    ///
    /// Returns the completion signal of the new child, or `None` if the
    /// spawn failed.
    async fn spawn(&self, trigger: &str) -> Option<watch::Receiver<bool>> {
        let id = self.options.id;
        {
            let mut state = self.state();
            if state.shutting_down {
                debug!(supervisor = id, trigger = %trigger, "shutting down, not spawning");
                return None;
            }
            state.phase = SupervisorPhase::Starting;
            state.killed = false;
        }

        debug!(supervisor = id, trigger = %trigger, argv = ?self.options.argv, "spawning command");

        let spawned = match self.backend.spawn(&self.options.argv, (self.options.terminal_size)()) {
            Ok(spawned) => spawned,
            Err(err) => {
                warn!(supervisor = id, error = %err, "failed to spawn command");
                self.state().phase = SupervisorPhase::Idle;
                self.info(format!("{err:#}")).await;
                return None;
            }
        };

        let control = spawned.control;
        info!(supervisor = id, pid = ?control.pid(), trigger = %trigger, "command started");

        for output in spawned.outputs {
            let sink = self.sink.clone();
            tokio::task::spawn_blocking(move || stream_lines(output, id, sink));
        }

        let (done_tx, done_rx) = watch::channel(false);
        let shutting_down = {
            let mut state = self.state();
            state.running = true;
            state.phase = SupervisorPhase::Running;
            state.live = Some(LiveProcess {
                control: Arc::clone(&control),
                done: done_rx.clone(),
            });
            state.shutting_down
        };

        if self.backend.has_terminal() {
            spawn_resize_forwarder(
                Arc::clone(&control),
                done_rx.clone(),
                self.options.terminal_size,
            );
        }

        let waiter = spawned.waiter;
        let state = Arc::clone(&self.state);
        let sink = self.sink.clone();
        tokio::spawn(async move {
            let exit = match tokio::task::spawn_blocking(move || waiter.wait()).await {
                Ok(result) => result.map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };

            let killed = lock_state(&state).killed;
            match &exit {
                Ok(report) if !report.success && !killed => {
                    sink.send(OutputMessage::supervisor(
                        id,
                        format!("(error exit: {})", report.description),
                    ))
                    .await;
                }
                Ok(report) => {
                    debug!(supervisor = id, killed, status = %report.description, "command exited");
                }
                Err(err) => warn!(supervisor = id, error = %err, "waiting for child failed"),
            }

            {
                let mut state = lock_state(&state);
                state.running = false;
                state.phase = SupervisorPhase::Stopped;
                state.live = None;
            }
            done_tx.send_replace(true);
        });

        // Shutdown began while the backend was spawning.
        if shutting_down {
            self.terminate().await;
        }

        Some(done_rx)
    }

    /// Stop the live child, escalating on a timeout ladder:
    ///
    /// 1. write the interrupt byte to its terminal
    /// 2. after `shutdown_timeout`, SIGINT to its process group
    /// 3. after every further `shutdown_timeout`, SIGKILL to its group
    ///
    /// Returns once the completion signal has been observed. Safe to call
    /// concurrently and repeatedly; returns immediately with no live child.
    pub async fn terminate(&self) {
        let id = self.options.id;
        let (control, mut done) = {
            let mut state = self.state();
            let Some(live) = state.live.as_ref() else {
                return;
            };
            let handles = (Arc::clone(&live.control), live.done.clone());
            state.killed = true;
            state.phase = SupervisorPhase::Terminating;
            handles
        };

        // Fails harmlessly if the child already died.
        if let Err(err) = control.write_interrupt() {
            debug!(supervisor = id, error = %err, "writing interrupt byte failed");
        }

        let timeout = self.options.shutdown_timeout;
        let mut signal = GroupSignal::Interrupt;
        loop {
            let timed_out = tokio::select! {
                () = wait_finished(&mut done) => false,
                () = sleep(timeout) => true,
            };
            if !timed_out {
                return;
            }

            self.info(format!("Sending {signal} signal...")).await;
            match control.signal_group(signal) {
                Ok(()) => {}
                Err(SignalError::Gone) => {
                    debug!(supervisor = id, "process group already gone");
                    wait_finished(&mut done).await;
                    return;
                }
                Err(err) => {
                    warn!(supervisor = id, %signal, error = %err, "failed to signal process group");
                    self.info(format!("Error killing: {err}")).await;
                }
            }
            signal = GroupSignal::Kill;
        }
    }

    /// Dispatch loop: run the command once per change handed over by the
    /// debouncer. Never overlaps two instances of the command.
    pub async fn run_dispatch(self: Arc<Self>, changes: Taker<String>) {
        if self.options.mode == SupervisorMode::Service {
            self.start("").await;
        }

        while let Some(path) = changes.take().await {
            if self.is_shutting_down() {
                break;
            }
            debug!(supervisor = self.options.id, path = %path, "dispatching change");
            self.start(&path).await;
        }

        debug!(supervisor = self.options.id, "dispatch loop finished");
    }
}

/// Resolve once the completion signal has fired (or its sender is gone).
pub(crate) async fn wait_finished(done: &mut watch::Receiver<bool>) {
    let _ = done.wait_for(|finished| *finished).await;
}

fn lock_state(state: &Mutex<SupervisorState>) -> MutexGuard<'_, SupervisorState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Forward a child's output to the sink, one message per line.
///
/// Runs on a blocking thread. A read error ends the stream: on a pty that
/// is what the child exiting looks like.
fn stream_lines(output: Box<dyn Read + Send>, id: u32, sink: OutputSink) {
    let mut reader = BufReader::new(output);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if !sink.blocking_send(OutputMessage::supervisor(id, line)) {
                    break;
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}
