// src/exec/resize.rs

//! Forwarding of terminal size changes to a child's pty.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::exec::backend::{ProcessControl, TermSize};
use crate::exec::supervisor::wait_finished;

/// Size of the terminal this process is attached to, if any.
pub fn current_terminal_size() -> Option<TermSize> {
    match crossterm::terminal::size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => Some(TermSize { rows, cols }),
        _ => None,
    }
}

fn apply_size(control: &dyn ProcessControl, size_of: fn() -> Option<TermSize>) {
    let Some(size) = size_of() else {
        return;
    };
    // Errors are expected when stdout is not a terminal or the child is gone.
    if let Err(err) = control.resize(size) {
        trace!(error = %err, "failed to resize child pty");
    }
}

/// Apply the size reported by `size_of` once, then again on every
/// window-size-change notification until `done` fires.
pub fn spawn_resize_forwarder(
    control: Arc<dyn ProcessControl>,
    mut done: watch::Receiver<bool>,
    size_of: fn() -> Option<TermSize>,
) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            // Subscribe before the first resize so no change slips between.
            let winch = signal(SignalKind::window_change());
            apply_size(control.as_ref(), size_of);

            let mut winch = match winch {
                Ok(stream) => stream,
                Err(err) => {
                    debug!(error = %err, "cannot subscribe to window size changes");
                    return;
                }
            };

            loop {
                tokio::select! {
                    () = wait_finished(&mut done) => break,
                    received = winch.recv() => {
                        if received.is_none() || *done.borrow() {
                            break;
                        }
                        apply_size(control.as_ref(), size_of);
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            apply_size(control.as_ref(), size_of);
            wait_finished(&mut done).await;
        }

        trace!(pid = ?control.pid(), "resize forwarder finished");
    });
}
