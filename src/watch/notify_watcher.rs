// src/watch/notify_watcher.rs

//! Event-driven directory watcher.
//!
//! Directories are watched one level at a time so that whole subtrees can be
//! skipped when every matcher certifies (via [`Matcher::exclude_prefix`])
//! that nothing below them can ever match.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::watch::WatcherHandle;
use crate::watch::matcher::Matcher;
use crate::watch::path_utils::{normalize, relative_str};

/// True if every matcher rules out all paths under `prefix`.
pub fn prefix_excluded(matchers: &[Arc<dyn Matcher>], prefix: &str) -> bool {
    !matchers.is_empty() && matchers.iter().all(|m| m.exclude_prefix(prefix))
}

/// Collect `root` and every directory below it that is not excluded.
///
/// Excluded directories are not descended into.
pub fn collect_watch_dirs(
    fs: &dyn FileSystem,
    root: &Path,
    start: &Path,
    matchers: &[Arc<dyn Matcher>],
) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    let mut stack = vec![start.to_path_buf()];

    while let Some(dir) = stack.pop() {
        if dir != root {
            if let Some(rel) = relative_str(root, &dir) {
                let prefix = normalize(&rel, true);
                if prefix_excluded(matchers, &prefix) {
                    debug!(dir = %prefix, "skipping excluded directory");
                    continue;
                }
            }
        }

        match fs.read_dir(&dir) {
            Ok(entries) => stack.extend(entries.into_iter().filter(|p| fs.is_dir(p))),
            Err(err) => warn!(dir = ?dir, error = %err, "failed to list directory"),
        }
        dirs.push(dir);
    }

    dirs
}

/// Spawn a `notify`-backed watcher over `root`.
///
/// Each filesystem event path is relativized against `root`, normalized,
/// and sent on `changes`. Directories created later are added to the watch
/// set subject to the same exclusion check.
pub fn spawn_notify_watcher(
    root: impl Into<PathBuf>,
    matchers: Vec<Arc<dyn Matcher>>,
    fs: Arc<dyn FileSystem>,
    changes: mpsc::Sender<String>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // Bounded; the notify thread blocks rather than queueing without limit.
    let (event_tx, mut event_rx) = mpsc::channel::<notify::Result<Event>>(1);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // Only fails once the async side has shut down.
            let _ = event_tx.blocking_send(res);
        },
        Config::default(),
    )?;

    let mut watched = 0usize;
    for dir in collect_watch_dirs(fs.as_ref(), &root, &root, &matchers) {
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        watched += 1;
    }
    info!(root = ?root, watched, "notify watcher started");

    let watcher = Arc::new(Mutex::new(watcher));
    let task = tokio::spawn(async move {
        while let Some(res) = event_rx.recv().await {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    warn!(error = %err, "file watch error");
                    continue;
                }
            };

            for path in event.paths {
                let Some(rel) = relative_str(&root, &path) else {
                    warn!(?path, ?root, "could not relativize event path");
                    continue;
                };
                let is_dir = fs.is_dir(&path);

                if is_dir && matches!(event.kind, EventKind::Create(_)) {
                    // Not awaited: `watch` round-trips through the notify
                    // thread, which may itself be blocked on our channel.
                    let watcher = Arc::clone(&watcher);
                    let fs = Arc::clone(&fs);
                    let root = root.clone();
                    let matchers = matchers.clone();
                    let path = path.clone();
                    tokio::task::spawn_blocking(move || {
                        let dirs = collect_watch_dirs(fs.as_ref(), &root, &path, &matchers);
                        let mut watcher = watcher.lock().unwrap_or_else(|p| p.into_inner());
                        for dir in dirs {
                            if let Err(err) = watcher.watch(&dir, RecursiveMode::NonRecursive) {
                                warn!(dir = ?dir, error = %err, "failed to watch new directory");
                            }
                        }
                    });
                }

                let change = normalize(&rel, is_dir);
                debug!(path = %change, kind = ?event.kind, "filesystem event");
                if changes.send(change).await.is_err() {
                    debug!("change receiver dropped; stopping notify watcher");
                    return;
                }
            }
        }
        debug!("notify event loop finished");
    });

    Ok(WatcherHandle::new(task))
}
