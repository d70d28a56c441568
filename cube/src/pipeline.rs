//! Staged solve: walk the subgoals, ask the engine for each, verify, advance.

use tracing::{debug, info, instrument, warn};

use crate::core::error::CubeError;
use crate::core::facelet::FaceletState;
use crate::core::moves::{Move, apply_moves, format_moves, parse_moves};
use crate::core::planner::{Subgoal, SubgoalPlanner, create_goal_state};
use crate::core::types::{PipelineState, SolveFailure, SolveOutcome, SolveReport, SolveStep};
use crate::io::process::CancelToken;
use crate::io::solver::{SearchEngine, SearchRequest};

/// Internal stages carry the data each transition needs.
enum Stage {
    Pending(usize),
    Solving {
        index: usize,
        goal: FaceletState,
    },
    Verifying {
        index: usize,
        goal: FaceletState,
        moves: Vec<Move>,
        result: FaceletState,
    },
    Advancing(SolveStep),
    Solved,
    Failed {
        index: usize,
        error: CubeError,
    },
}

impl Stage {
    fn observed(&self) -> PipelineState {
        match self {
            Stage::Pending(index) => PipelineState::Pending(*index),
            Stage::Solving { index, .. } => PipelineState::Solving(*index),
            Stage::Verifying { index, .. } => PipelineState::Verifying(*index),
            Stage::Advancing(step) => PipelineState::Advancing(step.step - 1),
            Stage::Solved => PipelineState::Solved,
            Stage::Failed { index, error } => PipelineState::Failed {
                index: *index,
                reason: error.clone(),
            },
        }
    }
}

/// Sequential solver over a fixed strategy. One run owns one current state.
pub struct SolvePipeline<'a, E: SearchEngine> {
    planner: &'a SubgoalPlanner,
    engine: &'a E,
    cancel: CancelToken,
}

impl<'a, E: SearchEngine> SolvePipeline<'a, E> {
    pub fn new(planner: &'a SubgoalPlanner, engine: &'a E) -> Self {
        Self {
            planner,
            engine,
            cancel: CancelToken::new(),
        }
    }

    /// Share `cancel` with another thread to stop the run and kill a live engine.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Solve from a positional `initial` state.
    pub fn run(&self, initial: FaceletState) -> SolveReport {
        self.run_with(initial, |_| {})
    }

    /// Like [`Self::run`], reporting every state the machine enters.
    ///
    /// Stops at the first failure; the report keeps every step verified
    /// before it. Subgoals already satisfied on arrival are skipped without
    /// consulting the engine.
    #[instrument(skip_all, fields(subgoals = self.planner.len()))]
    pub fn run_with<F: FnMut(&PipelineState)>(
        &self,
        initial: FaceletState,
        mut on_state: F,
    ) -> SolveReport {
        let mut current = initial;
        let mut steps: Vec<SolveStep> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();
        let mut stage = Stage::Pending(0);

        let outcome = loop {
            on_state(&stage.observed());
            stage = match stage {
                Stage::Pending(index) => match self.planner.get(index) {
                    None => Stage::Solved,
                    Some(_) if self.cancel.is_cancelled() => Stage::Failed {
                        index,
                        error: CubeError::Cancelled,
                    },
                    Some(subgoal) if subgoal.mask.is_satisfied_by(&current) => {
                        debug!(index, subgoal = %subgoal.name, "subgoal already satisfied");
                        skipped.push(subgoal.name.clone());
                        Stage::Pending(index + 1)
                    }
                    Some(subgoal) => Stage::Solving {
                        index,
                        goal: create_goal_state(&subgoal.mask, &current),
                    },
                },
                Stage::Solving { index, goal } => {
                    let subgoal = self.subgoal(index);
                    match self.search(index, subgoal, &current, &goal) {
                        Ok(moves) => Stage::Verifying {
                            index,
                            goal,
                            result: apply_moves(&current, &moves),
                            moves,
                        },
                        Err(error) => Stage::Failed { index, error },
                    }
                }
                Stage::Verifying {
                    index,
                    goal,
                    moves,
                    result,
                } => {
                    let subgoal = self.subgoal(index);
                    match subgoal.mask.mismatches(&result, &goal) {
                        0 => Stage::Advancing(SolveStep {
                            step: index + 1,
                            subgoal: subgoal.name.clone(),
                            goal,
                            moves,
                            result,
                        }),
                        mismatched => Stage::Failed {
                            index,
                            error: CubeError::SubgoalVerification { mismatched },
                        },
                    }
                }
                Stage::Advancing(step) => {
                    info!(
                        step = step.step,
                        subgoal = %step.subgoal,
                        moves = %format_moves(&step.moves),
                        "subgoal reached"
                    );
                    let next = step.step;
                    current = step.result;
                    steps.push(step);
                    Stage::Pending(next)
                }
                Stage::Solved => break SolveOutcome::Solved,
                Stage::Failed { index, error } => {
                    warn!(index, kind = error.kind(), err = %error, "solve failed");
                    break SolveOutcome::Failed(SolveFailure {
                        step: index + 1,
                        subgoal: self.subgoal(index).name.clone(),
                        error,
                    });
                }
            };
        };

        SolveReport {
            initial,
            steps,
            skipped,
            final_state: current,
            outcome,
        }
    }

    // Only called with indices that `Pending` already resolved.
    fn subgoal(&self, index: usize) -> &Subgoal {
        &self.planner.subgoals()[index]
    }

    fn search(
        &self,
        index: usize,
        subgoal: &Subgoal,
        current: &FaceletState,
        goal: &FaceletState,
    ) -> Result<Vec<Move>, CubeError> {
        let request = SearchRequest {
            step: index + 1,
            subgoal: &subgoal.name,
            current,
            goal,
            cancel: &self.cancel,
        };
        let text = self.engine.search(&request)?;
        let moves = parse_moves(&text)?;
        if moves.is_empty() {
            return Err(CubeError::SolverNoSolution { raw: text });
        }
        debug!(index, count = moves.len(), "parsed engine moves");
        Ok(moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moves::apply_sequence;
    use crate::core::planner::SubgoalMask;
    use crate::test_support::ScriptedEngine;

    fn full_solve() -> SubgoalPlanner {
        SubgoalPlanner::new(vec![Subgoal::new(
            "everything",
            SubgoalMask::fixed(&FaceletState::solved()),
        )])
    }

    #[test]
    fn reports_every_transition_in_order() {
        let planner = full_solve();
        let engine = ScriptedEngine::new(["R'"]);
        let start = apply_sequence(&FaceletState::solved(), "R").expect("scramble");

        let mut seen = Vec::new();
        let report = SolvePipeline::new(&planner, &engine).run_with(start, |s| seen.push(s.clone()));

        assert!(report.is_solved());
        assert_eq!(
            seen,
            vec![
                PipelineState::Pending(0),
                PipelineState::Solving(0),
                PipelineState::Verifying(0),
                PipelineState::Advancing(0),
                PipelineState::Pending(1),
                PipelineState::Solved,
            ]
        );
        assert_eq!(report.final_state, FaceletState::solved());
        assert_eq!(report.steps[0].moves, parse_moves("R'").expect("moves"));
    }

    #[test]
    fn empty_engine_answer_is_no_solution() {
        let planner = full_solve();
        let engine = ScriptedEngine::new(["   "]);
        let start = apply_sequence(&FaceletState::solved(), "F").expect("scramble");
        let report = SolvePipeline::new(&planner, &engine).run(start);
        let failure = report.failure().expect("failure");
        assert!(matches!(failure.error, CubeError::SolverNoSolution { .. }));
        assert_eq!(report.final_state, start);
    }

    #[test]
    fn cancelled_before_start_never_calls_engine() {
        let planner = full_solve();
        let engine = ScriptedEngine::new(["R'"]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let start = apply_sequence(&FaceletState::solved(), "R").expect("scramble");

        let report = SolvePipeline::new(&planner, &engine)
            .with_cancel(cancel)
            .run(start);
        let failure = report.failure().expect("failure");
        assert_eq!(failure.error, CubeError::Cancelled);
        assert_eq!(failure.step, 1);
        assert_eq!(engine.calls().len(), 0);
    }
}
