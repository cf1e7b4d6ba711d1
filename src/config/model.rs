// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{SupervisorMode, WatchBackendKind};

/// Raw configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// path = "main/main.go"
/// backend = "poll"
/// poll_interval = "500ms"
///
/// [[command]]
/// regex = '\.go$'
/// argv = ["go", "run", "./main"]
/// mode = "service"
/// shutdown_timeout = "500ms"
/// quiet_interval = "300ms"
/// ```
///
/// All sections are optional and have reasonable defaults, but at least one
/// command must exist once CLI values have been merged in.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    /// All `[[command]]` entries, in file order.
    #[serde(default)]
    pub command: Vec<CommandConfig>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// The one path to watch (file or directory).
    #[serde(default = "default_path")]
    pub path: String,

    #[serde(default)]
    pub backend: WatchBackendKind,

    /// Interval for the polling backend, e.g. `"500ms"`.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Capture output through pipes instead of a pseudo-terminal.
    #[serde(default)]
    pub no_pty: bool,
}

fn default_path() -> String {
    ".".to_string()
}

fn default_poll_interval() -> String {
    "500ms".to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            path: default_path(),
            backend: WatchBackendKind::default(),
            poll_interval: default_poll_interval(),
            no_pty: false,
        }
    }
}

/// `[[command]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandConfig {
    /// Regular expression a change path must match.
    #[serde(default = "default_regex")]
    pub regex: String,

    /// Invert the match: run on paths the regex does *not* match.
    #[serde(default)]
    pub inverse: bool,

    /// Program followed by its arguments.
    pub argv: Vec<String>,

    #[serde(default)]
    pub mode: SupervisorMode,

    /// Delay between termination escalation stages.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout: String,

    /// Debounce window.
    #[serde(default = "default_quiet_interval")]
    pub quiet_interval: String,

    /// Where this entry came from; filled in by the loader or CLI merge.
    #[serde(skip)]
    pub source: Option<String>,
}

fn default_regex() -> String {
    ".*".to_string()
}

fn default_shutdown_timeout() -> String {
    "500ms".to_string()
}

fn default_quiet_interval() -> String {
    "300ms".to_string()
}

impl CommandConfig {
    /// An entry with default settings running `argv`.
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            regex: default_regex(),
            inverse: false,
            argv,
            mode: SupervisorMode::default(),
            shutdown_timeout: default_shutdown_timeout(),
            quiet_interval: default_quiet_interval(),
            source: None,
        }
    }
}

/// Validated configuration. Construct via `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSettings,
    pub commands: Vec<CommandSettings>,
}

#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub path: PathBuf,
    pub backend: WatchBackendKind,
    pub poll_interval: Duration,
    pub no_pty: bool,
}

#[derive(Debug, Clone)]
pub struct CommandSettings {
    pub source: String,
    pub regex: String,
    pub inverse: bool,
    pub argv: Vec<String>,
    pub mode: SupervisorMode,
    pub shutdown_timeout: Duration,
    pub quiet_interval: Duration,
}
