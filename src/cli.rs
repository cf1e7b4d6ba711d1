// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::types::{SupervisorMode, WatchBackendKind};

/// Command-line arguments for `reflex`.
///
/// Watch flags override the `[watch]` section of `--config`. When a command
/// is given after `--`, the command flags configure it and it is added next
/// to any `[[command]]` entries from the file.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "reflex",
    version,
    about = "Run a command when files change; restart it if it's a service.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a config file (TOML) with `[watch]` and `[[command]]` sections.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// File or directory to watch. Default: `.`
    #[arg(short = 'p', long, value_name = "PATH")]
    pub path: Option<String>,

    /// Regular expression a changed path must match. Default: `.*`
    #[arg(short = 'r', long, value_name = "REGEX")]
    pub regex: Option<String>,

    /// Run on paths that do NOT match the regex.
    #[arg(short = 'v', long)]
    pub inverse: bool,

    /// `service` restarts a long-running command; `once` runs it to completion
    /// per change.
    #[arg(short = 'm', long, value_name = "MODE")]
    pub mode: Option<SupervisorMode>,

    /// Delay between termination escalation stages, e.g. `500ms`.
    #[arg(short = 't', long, value_name = "DURATION")]
    pub shutdown_timeout: Option<String>,

    /// Debounce window: how long changes must be quiet before a run.
    #[arg(short = 'q', long, value_name = "DURATION")]
    pub quiet_interval: Option<String>,

    /// Polling interval for the `poll` backend.
    #[arg(long, value_name = "DURATION")]
    pub poll_interval: Option<String>,

    /// Change detection backend: `poll` or `notify`.
    #[arg(long, value_name = "BACKEND")]
    pub backend: Option<WatchBackendKind>,

    /// Capture command output through pipes instead of a pseudo-terminal.
    #[arg(long)]
    pub no_pty: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REFLEX_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print each configured reflex, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Command to run, with its arguments.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
