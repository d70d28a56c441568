//! Shared deterministic types for the solve pipeline.
//!
//! These are the stable contracts between the pipeline, the plan renderer and
//! the JSON report. They carry no I/O and never change once built.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::core::error::CubeError;
use crate::core::facelet::FaceletState;
use crate::core::moves::Move;

/// Where a pipeline run currently is. Indices are 0-based subgoal positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Pending(usize),
    Solving(usize),
    Verifying(usize),
    Advancing(usize),
    Solved,
    Failed { index: usize, reason: CubeError },
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Solved | PipelineState::Failed { .. })
    }
}

/// One verified subgoal. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolveStep {
    /// 1-based position of the subgoal in the strategy.
    pub step: usize,
    pub subgoal: String,
    pub goal: FaceletState,
    pub moves: Vec<Move>,
    pub result: FaceletState,
}

/// First failure of a run, with enough context to retry or re-plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveFailure {
    /// 1-based position of the failing subgoal.
    pub step: usize,
    pub subgoal: String,
    pub error: CubeError,
}

impl Serialize for SolveFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SolveFailure", 4)?;
        state.serialize_field("step", &self.step)?;
        state.serialize_field("subgoal", &self.subgoal)?;
        state.serialize_field("kind", self.error.kind())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SolveOutcome {
    Solved,
    Failed(SolveFailure),
}

/// Everything a run produced, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SolveReport {
    pub initial: FaceletState,
    pub steps: Vec<SolveStep>,
    /// Subgoals already satisfied on arrival; no engine was spawned for them.
    pub skipped: Vec<String>,
    pub final_state: FaceletState,
    pub outcome: SolveOutcome,
}

impl SolveReport {
    pub fn is_solved(&self) -> bool {
        matches!(self.outcome, SolveOutcome::Solved)
    }

    pub fn failure(&self) -> Option<&SolveFailure> {
        match &self.outcome {
            SolveOutcome::Solved => None,
            SolveOutcome::Failed(failure) => Some(failure),
        }
    }

    pub fn move_count(&self) -> usize {
        self.steps.iter().map(|step| step.moves.len()).sum()
    }
}
