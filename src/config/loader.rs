// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{CommandConfig, ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Source tag of the command given on the command line.
pub const COMMAND_LINE_SOURCE: &str = "[command line]";

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Each `[[command]]` entry is tagged with where it came from.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let mut config: RawConfigFile = toml::from_str(&contents)?;
    for (idx, cmd) in config.command.iter_mut().enumerate() {
        cmd.source = Some(format!("{}, entry {}", path.display(), idx));
    }

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// Build the effective configuration from CLI arguments.
///
/// - Starts from `--config` if given, otherwise from defaults.
/// - CLI watch flags override `[watch]`.
/// - A trailing CLI command becomes one more command entry, configured by
///   the CLI command flags.
pub fn resolve(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };

    if let Some(path) = &args.path {
        raw.watch.path = path.clone();
    }
    if let Some(backend) = args.backend {
        raw.watch.backend = backend;
    }
    if let Some(interval) = &args.poll_interval {
        raw.watch.poll_interval = interval.clone();
    }
    if args.no_pty {
        raw.watch.no_pty = true;
    }

    if !args.command.is_empty() {
        let mut cmd = CommandConfig::new(args.command.clone());
        if let Some(regex) = &args.regex {
            cmd.regex = regex.clone();
        }
        cmd.inverse = args.inverse;
        if let Some(mode) = args.mode {
            cmd.mode = mode;
        }
        if let Some(timeout) = &args.shutdown_timeout {
            cmd.shutdown_timeout = timeout.clone();
        }
        if let Some(quiet) = &args.quiet_interval {
            cmd.quiet_interval = quiet.clone();
        }
        cmd.source = Some(COMMAND_LINE_SOURCE.to_string());
        raw.command.push(cmd);
    }

    ConfigFile::try_from(raw)
}
