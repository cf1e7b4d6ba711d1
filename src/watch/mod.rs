// src/watch/mod.rs

//! Change detection.
//!
//! This module is responsible for:
//! - Observing the one watched path, either by polling its metadata
//!   ([`poller`]) or through filesystem events ([`notify_watcher`]).
//! - Normalizing change paths ([`path_utils`]).
//! - Deciding which paths are relevant to a command ([`matcher`]).
//!
//! It does **not** know about debouncing or processes; it only produces
//! normalized change notifications.

pub mod matcher;
pub mod notify_watcher;
pub mod path_utils;
pub mod poller;

pub use matcher::{Matcher, RegexMatcher};
pub use notify_watcher::spawn_notify_watcher;
pub use path_utils::normalize;
pub use poller::{PathWatcher, DEFAULT_POLL_INTERVAL};

use tokio::task::JoinHandle;

/// Handle for a running watcher.
///
/// Dropping the handle leaves the watcher running; call [`WatcherHandle::stop`]
/// to end it.
pub struct WatcherHandle {
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    pub fn stop(&self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("finished", &self.task.is_finished())
            .finish()
    }
}
