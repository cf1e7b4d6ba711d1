// src/watch/poller.rs

//! Polling watcher for a single path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

use crate::fs::{FileStat, FileSystem};
use crate::watch::path_utils::{normalize, relative_to_cwd};
use crate::watch::WatcherHandle;

/// Default interval between two metadata polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Polls one path and emits a normalized change notification whenever its
/// size or modification time differs from the last snapshot.
///
/// Only metadata is read. A failed `stat` (the file is mid-replacement, the
/// directory was briefly renamed, ...) is treated as transient: the previous
/// snapshot is kept and the next tick simply tries again.
#[derive(Debug)]
pub struct PathWatcher {
    path: PathBuf,
    interval: Duration,
    fs: Arc<dyn FileSystem>,
}

impl PathWatcher {
    pub fn new(path: impl Into<PathBuf>, interval: Duration, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            interval,
            fs,
        }
    }

    /// Spawn the polling loop on the current runtime.
    pub fn spawn(self, changes: mpsc::Sender<String>) -> WatcherHandle {
        info!(path = ?self.path, interval = ?self.interval, "polling watcher started");
        WatcherHandle::new(tokio::spawn(self.run(changes)))
    }

    /// Poll until the receiving side of `changes` goes away.
    pub async fn run(self, changes: mpsc::Sender<String>) {
        let shown = relative_to_cwd(&self.path);
        let mut snapshot: Option<FileStat> = None;

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let stat = match self.fs.stat(&self.path) {
                Ok(stat) => stat,
                Err(err) => {
                    trace!(path = %shown, error = %err, "stat failed; retrying next tick");
                    continue;
                }
            };

            let Some(previous) = snapshot.as_ref() else {
                debug!(path = %shown, size = stat.size, "initial snapshot taken");
                snapshot = Some(stat);
                continue;
            };

            if !stat.changed_from(previous) {
                continue;
            }

            let change = normalize(&shown, stat.is_dir);
            debug!(path = %change, size = stat.size, "change detected");
            snapshot = Some(stat);

            if changes.send(change).await.is_err() {
                debug!(path = %shown, "change receiver dropped; stopping poller");
                break;
            }
        }
    }
}
