// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a [`TerminalBackend`] instead of spawning
//! processes itself. A backend spawns one command and hands back:
//! - a [`ProcessControl`] for the cooperative interrupt byte, terminal
//!   resizes, and process-group signals
//! - one or more output streams
//! - a [`ProcessWaiter`] that blocks until the child exits
//!
//! - [`crate::exec::PtyBackend`] is the default: the child gets a fresh
//!   pseudo-terminal and becomes the leader of its own process group.
//! - [`crate::exec::PipeBackend`] captures stdout/stderr through pipes for
//!   environments without a pty. The interrupt byte and resizes are no-ops
//!   there; group signals still apply.
//! - Tests provide their own backend that doesn't spawn real processes.

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use crate::errors::SignalError;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermSize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TermSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

/// Signals sent to a child's whole process group during escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupSignal {
    Interrupt,
    Kill,
}

impl fmt::Display for GroupSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSignal::Interrupt => f.write_str("SIGINT"),
            GroupSignal::Kill => f.write_str("SIGKILL"),
        }
    }
}

/// How a child process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub success: bool,
    /// Human-readable reason, e.g. `exit status: 1`.
    pub description: String,
}

impl ExitReport {
    pub fn success() -> Self {
        Self {
            success: true,
            description: "exit status: 0".to_string(),
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            success: false,
            description: description.into(),
        }
    }
}

/// Control surface of a live child.
///
/// All methods must tolerate being called after the child has exited.
pub trait ProcessControl: Send + Sync {
    fn pid(&self) -> Option<u32>;

    /// Write the interactive break byte (ASCII 3, what ^C produces) to the
    /// child's terminal.
    fn write_interrupt(&self) -> io::Result<()>;

    /// Propagate a new terminal size to the child's terminal.
    fn resize(&self, size: TermSize) -> io::Result<()>;

    /// Signal the child's entire process group.
    fn signal_group(&self, signal: GroupSignal) -> Result<(), SignalError>;
}

/// Blocks until the child exits. Runs on a blocking thread.
pub trait ProcessWaiter: Send {
    fn wait(self: Box<Self>) -> io::Result<ExitReport>;
}

/// Everything the supervisor needs from a freshly spawned child.
pub struct SpawnedProcess {
    pub control: Arc<dyn ProcessControl>,
    /// Byte streams carrying the child's output. Reads may fail once the
    /// child is gone (pty teardown); callers treat that as end of stream.
    pub outputs: Vec<Box<dyn Read + Send>>,
    pub waiter: Box<dyn ProcessWaiter>,
}

impl fmt::Debug for SpawnedProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnedProcess")
            .field("pid", &self.control.pid())
            .field("outputs", &self.outputs.len())
            .finish_non_exhaustive()
    }
}

/// Spawns a command with a controllable terminal and group signalling.
pub trait TerminalBackend: Send + Sync + fmt::Debug {
    /// Spawn `argv` (program followed by arguments). `size` is the initial
    /// terminal size, when known.
    fn spawn(&self, argv: &[String], size: Option<TermSize>) -> anyhow::Result<SpawnedProcess>;

    /// Whether children get a real terminal (and therefore care about
    /// resize notifications).
    fn has_terminal(&self) -> bool;
}
