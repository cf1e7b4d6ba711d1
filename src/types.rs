use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

/// What a supervisor does with its command when a change is dispatched.
///
/// - `Service`: the command is a persistent process. A new trigger terminates
///   the running instance (fully) and starts a replacement (default).
/// - `Once`: the command is a one-shot task. Each trigger runs it to
///   completion before the next trigger is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupervisorMode {
    #[default]
    Service,
    Once,
}

impl FromStr for SupervisorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "service" => Ok(SupervisorMode::Service),
            "once" => Ok(SupervisorMode::Once),
            other => Err(format!(
                "invalid mode: {other} (expected \"service\" or \"once\")"
            )),
        }
    }
}

impl fmt::Display for SupervisorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorMode::Service => f.write_str("service"),
            SupervisorMode::Once => f.write_str("once"),
        }
    }
}

/// How the watched path is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchBackendKind {
    /// Poll size + modification time at a fixed interval.
    #[default]
    Poll,
    /// Filesystem events via `notify`, pruning excluded directories.
    Notify,
}

impl FromStr for WatchBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "poll" => Ok(WatchBackendKind::Poll),
            "notify" => Ok(WatchBackendKind::Notify),
            other => Err(format!(
                "invalid watch backend: {other} (expected \"poll\" or \"notify\")"
            )),
        }
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    // Find the boundary between digits and suffix.
    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };
    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{s}' is too large"))
}
