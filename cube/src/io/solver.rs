//! Search-engine abstraction and the external engine client.
//!
//! The [`SearchEngine`] trait decouples the pipeline from the actual search
//! backend. [`ExternalSolverClient`] spawns one engine process per subgoal and
//! speaks its line protocol; tests use scripted engines that return
//! predetermined answers without spawning anything.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Result, anyhow};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use crate::core::error::CubeError;
use crate::core::facelet::{Face, FaceletState};
use crate::io::config::SolverConfig;
use crate::io::plan_log::{engine_log_path, write_engine_log};
use crate::io::process::{CancelToken, ProcessError, run_command_with_timeout};

/// Block order the engine expects its 54-character states in.
pub const ENGINE_FACE_ORDER: [Face; 6] = [Face::U, Face::L, Face::F, Face::R, Face::B, Face::D];

const SOLUTION_MARKER: &str = "Solution:";

static MOVE_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\d+\)\s*$").expect("valid move count regex"));

/// Trailing run of move tokens, starting on a token boundary.
static TRAILING_MOVES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9'])((?:[UDLRBFMESxyz](?:'\d*|\d+'?)?\s*)+)$")
        .expect("valid trailing moves regex")
});

/// One subgoal's search: reach `goal` from `current`.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// 1-based position of the subgoal.
    pub step: usize,
    pub subgoal: &'a str,
    pub current: &'a FaceletState,
    pub goal: &'a FaceletState,
    pub cancel: &'a CancelToken,
}

/// Abstraction over search backends.
pub trait SearchEngine {
    /// Return the move sequence text that takes `request.current` to `request.goal`.
    fn search(&self, request: &SearchRequest<'_>) -> Result<String, CubeError>;
}

/// Engine driven over stdin/stdout, one process per call.
#[derive(Debug, Clone)]
pub struct ExternalSolverClient {
    program: PathBuf,
    args: Vec<String>,
    search: String,
    timeout: Duration,
    output_limit_bytes: usize,
    log_dir: Option<PathBuf>,
}

impl ExternalSolverClient {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            search: "tree astar".to_string(),
            timeout: Duration::from_secs(60),
            output_limit_bytes: 1_000_000,
            log_dir: None,
        }
    }

    pub fn from_config(config: &SolverConfig) -> Result<Self> {
        let (program, args) = config
            .engine
            .command
            .split_first()
            .ok_or_else(|| anyhow!("engine.command must be a non-empty array"))?;
        Ok(Self {
            program: PathBuf::from(program),
            args: args.to_vec(),
            search: config.engine.search.clone(),
            timeout: config.engine.timeout(),
            output_limit_bytes: config.engine.output_limit_bytes,
            log_dir: config.log_dir.clone(),
        })
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn not_found(&self) -> CubeError {
        CubeError::SolverNotFound(self.program.clone())
    }
}

impl SearchEngine for ExternalSolverClient {
    #[instrument(skip_all, fields(step = request.step, subgoal = request.subgoal, program = %self.program.display()))]
    fn search(&self, request: &SearchRequest<'_>) -> Result<String, CubeError> {
        if request.cancel.is_cancelled() {
            return Err(CubeError::Cancelled);
        }
        // Bare names are resolved through PATH by spawn; explicit paths are checked up front.
        if self.program.components().count() > 1 && !self.program.exists() {
            warn!("engine path does not exist");
            return Err(self.not_found());
        }

        let script = protocol_script(request.current, request.goal, &self.search);
        debug!(script = %script.trim_end(), "sending engine protocol");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        let output = match run_command_with_timeout(
            cmd,
            Some(script.as_bytes()),
            self.timeout,
            self.output_limit_bytes,
            request.cancel,
        ) {
            Ok(output) => output,
            Err(ProcessError::Spawn { source, .. })
                if matches!(
                    source.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
                ) =>
            {
                warn!(err = %source, "engine could not be started");
                return Err(self.not_found());
            }
            Err(err) => return Err(CubeError::SolverIo(err.to_string())),
        };

        if let Some(dir) = &self.log_dir {
            let path = engine_log_path(dir, request.step);
            if let Err(err) = write_engine_log(&path, &script, &output, self.output_limit_bytes) {
                warn!(err = %format!("{err:#}"), path = %path.display(), "failed to write engine log");
            }
        }

        if output.cancelled {
            return Err(CubeError::Cancelled);
        }
        if output.timed_out {
            return Err(CubeError::SolverTimeout(self.timeout));
        }

        let stdout = output.stdout_text();
        if !output.status.success() && stdout.trim().is_empty() {
            warn!(exit_code = ?output.status.code(), "engine failed without output");
            return Err(CubeError::SolverProcess {
                code: output.status.code(),
                stderr: output.stderr_text().trim().to_string(),
            });
        }

        match parse_solution(&stdout) {
            Some(moves) => {
                info!(%moves, "engine returned a solution");
                Ok(moves)
            }
            None => {
                warn!("no solution in engine output");
                Err(CubeError::SolverNoSolution { raw: stdout })
            }
        }
    }
}

/// Relabel a U,R,F,D,L,B state into the engine's U,L,F,R,B,D block order.
pub fn reblock_for_engine(state: &FaceletState) -> String {
    ENGINE_FACE_ORDER
        .iter()
        .flat_map(|&face| state.face(face).iter().map(|&cell| cell as char))
        .collect()
}

/// The four protocol lines for one search, each newline-terminated.
pub fn protocol_script(current: &FaceletState, goal: &FaceletState, search: &str) -> String {
    format!(
        "init cube {}\ninit goal {}\nsearch {search}\nexit\n",
        reblock_for_engine(current),
        reblock_for_engine(goal)
    )
}

/// Extract the move sequence from engine output.
///
/// Prefers the text after a `Solution:` marker; otherwise takes the trailing
/// run of move tokens on the last non-blank line, so `moves: R U F2` yields
/// `R U F2`. A trailing `(N)` move count is dropped either way.
pub fn parse_solution(output: &str) -> Option<String> {
    let marked = output
        .lines()
        .find_map(|line| line.split_once(SOLUTION_MARKER).map(|(_, rest)| rest))
        .map(strip_move_count)
        .filter(|moves| !moves.is_empty());
    if marked.is_some() {
        return marked;
    }

    let last = output.lines().rev().find(|line| !line.trim().is_empty())?;
    let line = strip_move_count(last);
    let moves = TRAILING_MOVES.captures(&line)?.get(1)?.as_str().trim();
    (!moves.is_empty()).then(|| moves.to_string())
}

fn strip_move_count(text: &str) -> String {
    MOVE_COUNT.replace(text, "").trim().to_string()
}
