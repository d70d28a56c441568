//! Test-only helpers: scripted search engines, fake engine executables and
//! scrambled states.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::CubeError;
use crate::core::facelet::FaceletState;
use crate::core::moves::apply_sequence;
use crate::io::solver::{SearchEngine, SearchRequest, reblock_for_engine};

/// What a [`ScriptedEngine`] saw for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSearch {
    pub step: usize,
    pub subgoal: String,
    pub current: FaceletState,
    pub goal: FaceletState,
}

/// Engine that answers from a queue. Running out of answers is a
/// `SolverNoSolution` failure.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    responses: RefCell<VecDeque<Result<String, CubeError>>>,
    calls: RefCell<Vec<RecordedSearch>>,
}

impl ScriptedEngine {
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::with_results(responses.into_iter().map(|r| Ok(r.into())))
    }

    pub fn with_results(results: impl IntoIterator<Item = Result<String, CubeError>>) -> Self {
        Self {
            responses: RefCell::new(results.into_iter().collect()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedSearch> {
        self.calls.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl SearchEngine for ScriptedEngine {
    fn search(&self, request: &SearchRequest<'_>) -> Result<String, CubeError> {
        self.calls.borrow_mut().push(RecordedSearch {
            step: request.step,
            subgoal: request.subgoal.to_string(),
            current: *request.current,
            goal: *request.goal,
        });
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(CubeError::SolverNoSolution {
                    raw: "scripted engine exhausted".to_string(),
                })
            })
    }
}

/// Write an executable `#!/bin/sh` script named `name` into `dir`.
#[cfg(unix)]
pub fn write_fake_engine(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write fake engine");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod fake engine");
    path
}

/// Fake engine that copies its stdin to `capture` and prints `Solution: <moves>`.
#[cfg(unix)]
pub fn write_capturing_engine(dir: &Path, capture: &Path, moves: &str) -> PathBuf {
    let body = format!(
        "cat > '{}'\necho 'searching...'\necho \"Solution: {moves} (0)\"",
        capture.display()
    );
    write_fake_engine(dir, "capturing-engine", &body)
}

/// The solved cube scrambled by `moves`.
pub fn scrambled(moves: &str) -> FaceletState {
    apply_sequence(&FaceletState::solved(), moves).expect("scramble")
}

/// The `init cube`/`init goal` lines an engine should receive.
pub fn expected_init_lines(current: &FaceletState, goal: &FaceletState) -> String {
    format!(
        "init cube {}\ninit goal {}\n",
        reblock_for_engine(current),
        reblock_for_engine(goal)
    )
}
