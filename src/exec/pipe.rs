// src/exec/pipe.rs

//! Pipe-based fallback backend.
//!
//! Used when a pseudo-terminal is unavailable or unwanted (`--no-pty`).
//! Output is captured from stdout and stderr separately. There is no
//! terminal, so the interrupt byte and resizes are accepted and ignored;
//! termination relies on the signal stages of the escalation ladder.

use std::io;
use std::process::{Command, Stdio};
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::errors::SignalError;
use crate::exec::backend::{
    ExitReport, GroupSignal, ProcessControl, ProcessWaiter, SpawnedProcess, TermSize,
    TerminalBackend,
};
use crate::exec::signal::signal_group;

#[derive(Debug, Clone, Default)]
pub struct PipeBackend;

impl TerminalBackend for PipeBackend {
    fn spawn(&self, argv: &[String], _size: Option<TermSize>) -> anyhow::Result<SpawnedProcess> {
        let (program, args) = argv.split_first().context("empty command")?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // New process group led by the child, so group signals reach
            // its descendants too.
            cmd.process_group(0);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning {program:?}"))?;

        let pid = child.id();
        debug!(pid, program = %program, "spawned child with piped output");

        let mut outputs: Vec<Box<dyn io::Read + Send>> = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            outputs.push(Box::new(stdout));
        }
        if let Some(stderr) = child.stderr.take() {
            outputs.push(Box::new(stderr));
        }

        Ok(SpawnedProcess {
            control: Arc::new(PipeControl { pid }),
            outputs,
            waiter: Box::new(PipeWaiter {
                child,
                reaped: false,
            }),
        })
    }

    fn has_terminal(&self) -> bool {
        false
    }
}

struct PipeControl {
    pid: u32,
}

impl ProcessControl for PipeControl {
    fn pid(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn write_interrupt(&self) -> io::Result<()> {
        Ok(())
    }

    fn resize(&self, _size: TermSize) -> io::Result<()> {
        Ok(())
    }

    fn signal_group(&self, signal: GroupSignal) -> Result<(), SignalError> {
        signal_group(Some(self.pid), signal)
    }
}

struct PipeWaiter {
    child: std::process::Child,
    reaped: bool,
}

impl ProcessWaiter for PipeWaiter {
    fn wait(mut self: Box<Self>) -> io::Result<ExitReport> {
        let status = self.child.wait()?;
        self.reaped = true;
        if status.success() {
            Ok(ExitReport::success())
        } else {
            Ok(ExitReport::failure(status.to_string()))
        }
    }
}

/// A waiter dropped before reaping its child kills and reaps it, so an
/// abandoned spawn never leaves a live process behind.
impl Drop for PipeWaiter {
    fn drop(&mut self) {
        if self.reaped || matches!(self.child.try_wait(), Ok(Some(_))) {
            return;
        }
        let pid = self.child.id();
        if let Err(err) = self.child.kill() {
            debug!(pid, error = %err, "killing abandoned child failed");
        }
        let _ = self.child.wait();
    }
}
