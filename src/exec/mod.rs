// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] defines the `TerminalBackend` abstraction: spawn with a
//!   controllable terminal plus signal-to-group.
//! - [`pty`] is the pseudo-terminal implementation used in production.
//! - [`pipe`] is the pipe-based fallback (`--no-pty`).
//! - [`signal`] sends signals to a child's process group.
//! - [`resize`] forwards window-size changes to a child's pty.
//! - [`supervisor`] owns one command's lifecycle: start, observe,
//!   terminate on an escalation ladder, restart.

pub mod backend;
pub mod pipe;
pub mod pty;
pub mod resize;
pub mod signal;
pub mod supervisor;

pub use backend::{
    ExitReport, GroupSignal, ProcessControl, ProcessWaiter, SpawnedProcess, TermSize,
    TerminalBackend,
};
pub use pipe::PipeBackend;
pub use pty::PtyBackend;
pub use supervisor::{
    Supervisor, SupervisorOptions, SupervisorPhase, DEFAULT_SHUTDOWN_TIMEOUT,
};
