//! Stable exit codes for cube-solver CLI commands.

/// Command succeeded (conversion produced a state, or the cube was solved).
pub const OK: i32 = 0;
/// Invalid input state, move sequence, config or store.
pub const INVALID: i32 = 1;
/// `cube-solver solve` stopped at a failing subgoal.
pub const SOLVE_FAILED: i32 = 2;
