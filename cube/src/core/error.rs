//! Error taxonomy shared by the cube core, the engine client and the pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Every failure the solve core can report.
///
/// Format and conversion errors surface synchronously from the pure core.
/// Engine and verification errors abort the current pipeline run and are
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CubeError {
    /// Wrong length, alphabet or per-symbol counts.
    #[error("format error: {0}")]
    Format(String),

    /// The six face centers are not pairwise distinct.
    #[error("invalid centers: face centers {centers} are not six distinct colors")]
    InvalidCenters { centers: String },

    #[error("invalid move token '{0}'")]
    InvalidMoveToken(String),

    #[error("search engine not found: {}", .0.display())]
    SolverNotFound(PathBuf),

    /// The engine exited unsuccessfully without producing any stdout.
    #[error("search engine failed with exit code {code:?}: {stderr}")]
    SolverProcess { code: Option<i32>, stderr: String },

    #[error("search engine timed out after {}s", .0.as_secs())]
    SolverTimeout(Duration),

    /// Output was produced but no move sequence could be parsed from it.
    #[error("search engine produced no solution; raw output: {raw}")]
    SolverNoSolution { raw: String },

    /// Reading or writing the engine's pipes failed after it was spawned.
    #[error("search engine i/o failed: {0}")]
    SolverIo(String),

    /// Applying the returned moves did not reach the masked goal.
    #[error("subgoal verification failed: {mismatched} masked cell(s) differ from the goal")]
    SubgoalVerification { mismatched: usize },

    #[error("solve cancelled")]
    Cancelled,
}

impl CubeError {
    /// Stable snake_case label for logs and serialized reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CubeError::Format(_) => "format_error",
            CubeError::InvalidCenters { .. } => "invalid_centers",
            CubeError::InvalidMoveToken(_) => "invalid_move_token",
            CubeError::SolverNotFound(_) => "solver_not_found",
            CubeError::SolverProcess { .. } => "solver_process_error",
            CubeError::SolverTimeout(_) => "solver_timeout",
            CubeError::SolverNoSolution { .. } => "solver_no_solution",
            CubeError::SolverIo(_) => "solver_io_error",
            CubeError::SubgoalVerification { .. } => "subgoal_verification_error",
            CubeError::Cancelled => "cancelled",
        }
    }
}
