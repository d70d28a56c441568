//! Human-readable rendering of a [`SolveReport`].

use std::sync::LazyLock;

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;

use crate::core::moves::format_moves;
use crate::core::types::SolveReport;

const PLAN_TEMPLATE: &str = include_str!("templates/plan.txt");

static ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_template("plan.txt", PLAN_TEMPLATE)
        .expect("plan template should be valid");
    env
});

#[derive(Debug, Serialize)]
struct StepLine {
    step: usize,
    subgoal: String,
    moves: String,
}

#[derive(Debug, Serialize)]
struct FailureLine {
    step: usize,
    subgoal: String,
    message: String,
}

/// One line per step, then either the solved state or the failure.
pub fn render_plan(report: &SolveReport) -> Result<String> {
    let steps: Vec<StepLine> = report
        .steps
        .iter()
        .map(|step| StepLine {
            step: step.step,
            subgoal: step.subgoal.clone(),
            moves: format_moves(&step.moves),
        })
        .collect();
    let failure = report.failure().map(|failure| FailureLine {
        step: failure.step,
        subgoal: failure.subgoal.clone(),
        message: failure.error.to_string(),
    });

    let template = ENV.get_template("plan.txt")?;
    let rendered = template.render(context! {
        total_moves => report.move_count(),
        steps => steps,
        skipped => report.skipped,
        failure => failure,
        final_state => report.final_state.to_string(),
    })?;
    Ok(rendered)
}
