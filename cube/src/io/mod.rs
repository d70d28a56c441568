//! Side-effecting operations (filesystem, child processes, persisted stores).
//!
//! Nothing in [`crate::core`] depends on this module.

pub mod config;
pub mod plan_log;
pub mod process;
pub mod solver;
pub mod transcripts;
