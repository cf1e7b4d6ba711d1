// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReflexError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid match pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Failed to spawn command: {0}")]
    SpawnError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Returned by [`crate::engine::Backlog`] operations that require a pending
/// path when there is none.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("backlog is empty")]
pub struct EmptyBacklog;

/// Failure to deliver a signal to a child's process group.
#[derive(Error, Debug)]
pub enum SignalError {
    /// The process group no longer exists; the child is already gone.
    #[error("no such process")]
    Gone,

    #[error("signal delivery failed: {0}")]
    Os(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ReflexError>;
