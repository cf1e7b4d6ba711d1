// src/engine/mod.rs

//! Change pipeline.
//!
//! This module ties together, per configured command:
//! - the path filter ([`filter`])
//! - the single-slot backlog ([`backlog`]) and the debouncer that owns it
//!   ([`debounce`])
//! - the rendezvous handoff to the supervisor's dispatch loop ([`handoff`])
//!
//! [`Reflex`] wires one of each around a [`crate::exec::Supervisor`].

pub mod backlog;
pub mod debounce;
pub mod filter;
pub mod handoff;
pub mod reflex;

pub use backlog::{Backlog, UnifiedBacklog};
pub use debounce::{Debouncer, DEFAULT_QUIET_INTERVAL};
pub use filter::{fan_out, filter_matching};
pub use reflex::{Reflex, ReflexHandle};
