//! Rubik's cube state model and staged solver.
//!
//! A cube is a 54-facelet state that can be converted between positional and
//! color notation, turned with any of the 18 face moves, and solved one
//! subgoal at a time by an external search engine. The architecture enforces
//! a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (facelets, notation, move tables,
//!   subgoal masks). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config file, engine processes,
//!   logs, transcript store). Isolated to enable scripted engines in tests.
//!
//! Orchestration modules ([`pipeline`], [`convert`], [`plan`]) coordinate
//! core logic with I/O to implement CLI commands.

pub mod convert;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod plan;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
