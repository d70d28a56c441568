//! Deterministic, pure logic for cube states.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! values and return deterministic outputs suitable for tests.

pub mod error;
pub mod facelet;
pub mod moves;
pub mod notation;
pub mod planner;
pub mod types;
