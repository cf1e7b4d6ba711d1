// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and merge CLI values (`loader.rs`).
//! - Validate it into typed settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve, COMMAND_LINE_SOURCE};
pub use model::{
    CommandConfig, CommandSettings, ConfigFile, RawConfigFile, WatchSection, WatchSettings,
};
