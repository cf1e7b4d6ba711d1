// src/exec/pty.rs

//! Pseudo-terminal backend built on `portable-pty`.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use tracing::debug;

use crate::errors::SignalError;
use crate::exec::backend::{
    ExitReport, GroupSignal, ProcessControl, ProcessWaiter, SpawnedProcess, TermSize,
    TerminalBackend,
};
use crate::exec::signal::signal_group;

/// ASCII ETX, what a terminal sends for ^C.
pub const INTERRUPT_BYTE: u8 = 3;

/// Spawns each command attached to a fresh pseudo-terminal.
///
/// On unix the child becomes a session (and process group) leader with the
/// pty as its controlling terminal, so group signals reach all of its
/// descendants.
#[derive(Debug, Clone, Default)]
pub struct PtyBackend;

impl TerminalBackend for PtyBackend {
    fn spawn(&self, argv: &[String], size: Option<TermSize>) -> anyhow::Result<SpawnedProcess> {
        let (program, args) = argv.split_first().context("empty command")?;

        let pair = native_pty_system()
            .openpty(pty_size(size.unwrap_or_default()))
            .context("opening pseudo-terminal")?;

        let mut builder = CommandBuilder::new(program);
        builder.args(args);
        if let Ok(cwd) = std::env::current_dir() {
            builder.cwd(cwd);
        }

        let child = pair
            .slave
            .spawn_command(builder)
            .with_context(|| format!("spawning {program:?} on a pty"))?;
        // Only the child may hold the slave side, otherwise reads on the
        // master never see the child go away.
        drop(pair.slave);

        let reader = pair.master.try_clone_reader().context("cloning pty reader")?;
        let writer = pair.master.take_writer().context("taking pty writer")?;
        let pid = child.process_id();
        debug!(?pid, program = %program, "spawned child on pty");

        let control = PtyControl {
            pid,
            master: Mutex::new(pair.master),
            writer: Mutex::new(writer),
        };

        Ok(SpawnedProcess {
            control: Arc::new(control),
            outputs: vec![reader],
            waiter: Box::new(PtyWaiter { child }),
        })
    }

    fn has_terminal(&self) -> bool {
        true
    }
}

fn pty_size(size: TermSize) -> PtySize {
    PtySize {
        rows: size.rows,
        cols: size.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

struct PtyControl {
    pid: Option<u32>,
    master: Mutex<Box<dyn MasterPty + Send>>,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ProcessControl for PtyControl {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn write_interrupt(&self) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|p| p.into_inner());
        writer.write_all(&[INTERRUPT_BYTE])?;
        writer.flush()
    }

    fn resize(&self, size: TermSize) -> io::Result<()> {
        let master = self.master.lock().unwrap_or_else(|p| p.into_inner());
        master.resize(pty_size(size)).map_err(io::Error::other)
    }

    fn signal_group(&self, signal: GroupSignal) -> Result<(), SignalError> {
        signal_group(self.pid, signal)
    }
}

struct PtyWaiter {
    child: Box<dyn Child + Send + Sync>,
}

impl ProcessWaiter for PtyWaiter {
    fn wait(mut self: Box<Self>) -> io::Result<ExitReport> {
        let status = self.child.wait()?;
        if status.success() {
            Ok(ExitReport::success())
        } else {
            Ok(ExitReport::failure(format!(
                "exit status: {}",
                status.exit_code()
            )))
        }
    }
}
