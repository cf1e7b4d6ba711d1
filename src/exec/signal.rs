// src/exec/signal.rs

//! Process-group signalling.

use crate::errors::SignalError;
use crate::exec::backend::GroupSignal;

/// Send `signal` to the process group led by `pid`.
///
/// Children are spawned as group leaders, so this reaches every descendant
/// that did not move itself to another group.
#[cfg(unix)]
pub fn signal_group(pid: Option<u32>, signal: GroupSignal) -> Result<(), SignalError> {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let Some(pid) = pid else {
        return Err(SignalError::Gone);
    };
    let pid = i32::try_from(pid).map_err(|_| SignalError::Os(format!("pid {pid} out of range")))?;

    let sig = match signal {
        GroupSignal::Interrupt => Signal::SIGINT,
        GroupSignal::Kill => Signal::SIGKILL,
    };

    match killpg(Pid::from_raw(pid), sig) {
        Ok(()) => Ok(()),
        Err(Errno::ESRCH) => Err(SignalError::Gone),
        Err(err) => Err(SignalError::Os(err.to_string())),
    }
}

#[cfg(not(unix))]
pub fn signal_group(pid: Option<u32>, _signal: GroupSignal) -> Result<(), SignalError> {
    match pid {
        None => Err(SignalError::Gone),
        Some(_) => Err(SignalError::Os(
            "process-group signals are not supported on this platform".to_string(),
        )),
    }
}
