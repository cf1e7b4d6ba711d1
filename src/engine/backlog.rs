// src/engine/backlog.rs

//! Holding area for change paths that arrive while the dispatch loop is
//! busy.

use std::fmt;

use crate::errors::EmptyBacklog;

/// Paths waiting to be dispatched.
pub trait Backlog: Send + fmt::Debug {
    /// Add a path to the backlog.
    fn add(&mut self, path: String);

    /// The path that should be dispatched next.
    fn next(&self) -> Result<&str, EmptyBacklog>;

    /// Remove the next path and return whether the backlog is now empty.
    fn remove_one(&mut self) -> Result<bool, EmptyBacklog>;

    fn is_empty(&self) -> bool;
}

/// Remembers a single path. The first path added wins until it has been
/// removed; later arrivals in the meantime are discarded.
///
/// Commands are not parameterized by the changed path, so one pending
/// dispatch carries the same information as many.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UnifiedBacklog {
    slot: Option<String>,
}

impl UnifiedBacklog {
    pub fn new() -> Self {
        Self { slot: None }
    }
}

impl Backlog for UnifiedBacklog {
    fn add(&mut self, path: String) {
        if self.slot.is_none() {
            self.slot = Some(path);
        }
    }

    fn next(&self) -> Result<&str, EmptyBacklog> {
        self.slot.as_deref().ok_or(EmptyBacklog)
    }

    fn remove_one(&mut self) -> Result<bool, EmptyBacklog> {
        self.slot.take().ok_or(EmptyBacklog)?;
        Ok(true)
    }

    fn is_empty(&self) -> bool {
        self.slot.is_none()
    }
}
