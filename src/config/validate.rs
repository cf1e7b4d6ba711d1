// src/config/validate.rs

use std::path::PathBuf;
use std::time::Duration;

use crate::config::model::{
    CommandConfig, CommandSettings, ConfigFile, RawConfigFile, WatchSettings,
};
use crate::errors::{ReflexError, Result};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ReflexError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_commands(&raw)?;

        let watch = validate_watch(&raw)?;
        let commands = raw
            .command
            .iter()
            .enumerate()
            .map(|(idx, cmd)| validate_command(idx, cmd))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile { watch, commands })
    }
}

fn ensure_has_commands(cfg: &RawConfigFile) -> Result<()> {
    if cfg.command.is_empty() {
        return Err(ReflexError::ConfigError(
            "no command given: pass one after `--` or add a [[command]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<WatchSettings> {
    if cfg.watch.path.trim().is_empty() {
        return Err(ReflexError::ConfigError(
            "[watch].path must not be empty".to_string(),
        ));
    }

    Ok(WatchSettings {
        path: PathBuf::from(&cfg.watch.path),
        backend: cfg.watch.backend,
        poll_interval: positive_duration("[watch].poll_interval", &cfg.watch.poll_interval)?,
        no_pty: cfg.watch.no_pty,
    })
}

fn validate_command(idx: usize, cmd: &CommandConfig) -> Result<CommandSettings> {
    let source = cmd
        .source
        .clone()
        .unwrap_or_else(|| format!("entry {idx}"));

    match cmd.argv.first() {
        Some(program) if !program.trim().is_empty() => {}
        _ => {
            return Err(ReflexError::ConfigError(format!(
                "{source}: argv must name a program"
            )));
        }
    }

    Ok(CommandSettings {
        regex: cmd.regex.clone(),
        inverse: cmd.inverse,
        argv: cmd.argv.clone(),
        mode: cmd.mode,
        shutdown_timeout: positive_duration(
            &format!("{source}: shutdown_timeout"),
            &cmd.shutdown_timeout,
        )?,
        quiet_interval: positive_duration(
            &format!("{source}: quiet_interval"),
            &cmd.quiet_interval,
        )?,
        source,
    })
}

fn positive_duration(field: &str, value: &str) -> Result<Duration> {
    let duration =
        parse_duration(value).map_err(|e| ReflexError::ConfigError(format!("{field}: {e}")))?;
    if duration.is_zero() {
        return Err(ReflexError::ConfigError(format!(
            "{field} must be greater than zero (got {value:?})"
        )));
    }
    Ok(duration)
}
