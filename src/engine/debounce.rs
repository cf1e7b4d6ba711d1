// src/engine/debounce.rs

//! Turns bursts of change notifications into throttled dispatches.
//!
//! Two phases:
//! - **Collecting**: the first notification of a burst goes into the
//!   backlog and starts a quiet-interval timer. Every further notification
//!   is added (a no-op while the slot is full) and restarts the timer.
//! - **Draining**: once the timer fires, keep accepting notifications while
//!   offering the backlog's current path to the dispatch loop. Each accepted
//!   handoff removes one entry; when the backlog is empty, go back to
//!   collecting.
//!
//! The dispatch loop only asks for a path when it is ready, so a busy or
//! restarting child never has more than the backlog's worth of pending work.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::engine::backlog::{Backlog, UnifiedBacklog};
use crate::engine::handoff::Giver;

/// Default quiet interval.
pub const DEFAULT_QUIET_INTERVAL: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub struct Debouncer<B = UnifiedBacklog> {
    backlog: B,
    quiet_interval: Duration,
}

impl Debouncer<UnifiedBacklog> {
    pub fn new(quiet_interval: Duration) -> Self {
        Self::with_backlog(UnifiedBacklog::new(), quiet_interval)
    }
}

impl<B: Backlog> Debouncer<B> {
    pub fn with_backlog(backlog: B, quiet_interval: Duration) -> Self {
        Self {
            backlog,
            quiet_interval,
        }
    }

    /// Run until the input closes (after flushing what is pending) or the
    /// dispatch side goes away.
    pub async fn run(mut self, mut input: mpsc::Receiver<String>, mut output: Giver<String>) {
        while let Some(first) = input.recv().await {
            trace!(path = %first, "burst started");
            self.backlog.add(first);
            let mut input_open = true;

            // Collecting.
            let timer = sleep(self.quiet_interval);
            tokio::pin!(timer);
            loop {
                tokio::select! {
                    () = &mut timer => break,
                    received = input.recv(), if input_open => match received {
                        Some(path) => {
                            self.backlog.add(path);
                            timer.as_mut().reset(Instant::now() + self.quiet_interval);
                        }
                        None => input_open = false,
                    },
                }
            }

            // Draining.
            loop {
                tokio::select! {
                    received = input.recv(), if input_open => match received {
                        Some(path) => self.backlog.add(path),
                        None => input_open = false,
                    },
                    request = output.request() => {
                        let Some(request) = request else {
                            debug!("dispatch side gone; debouncer stopping");
                            return;
                        };
                        let Ok(next) = self.backlog.next() else {
                            break;
                        };
                        match request.fulfil(next.to_string()) {
                            Ok(()) => {
                                debug!(path = %next, "dispatched");
                                if self.backlog.remove_one().unwrap_or(true) {
                                    break;
                                }
                            }
                            Err(_) => trace!("dispatch request abandoned; keeping path"),
                        }
                    }
                }
            }

            if !input_open {
                break;
            }
        }

        debug!("debouncer input closed");
    }
}
