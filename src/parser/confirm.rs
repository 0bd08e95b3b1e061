// ABOUTME: Human-readable confirmation rendering and dry-run simulation
// ABOUTME: Produces the approval text and a side-effect-free simulated execution plan

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::estimate::EstimateConfig;
use super::stage::{StageId, WorkflowPlan};

/// Render the plan as ordered, numbered stage descriptions plus totals.
/// Validation errors are appended verbatim.
pub fn render_confirmation(plan: &WorkflowPlan) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Workflow plan: {} stage(s)", plan.stages.len());
    for stage in &plan.stages {
        let items: Vec<String> = stage.items.iter().map(ToString::to_string).collect();
        let _ = write!(
            out,
            "  Stage {} ({}): {}",
            stage.id,
            stage.mode_label(),
            items.join(", ")
        );
        if stage.depends_on.is_empty() {
            let _ = writeln!(out);
        } else {
            let deps: Vec<String> = stage
                .depends_on
                .iter()
                .map(|id| format!("Stage {id}"))
                .collect();
            let _ = writeln!(out, " [after {}]", deps.join(", "));
        }
    }

    let _ = writeln!(out, "Total items: {}", plan.total_item_count);
    let _ = writeln!(
        out,
        "Estimated duration: {} minutes",
        plan.estimated_duration_minutes
    );
    let _ = writeln!(out, "Peak concurrency: {}", plan.peak_concurrency);

    if !plan.validation_errors.is_empty() {
        let _ = writeln!(out, "Validation errors:");
        for error in &plan.validation_errors {
            let _ = writeln!(out, "  - {error}");
        }
    }

    out
}

/// One stage of a simulated dry run: the exact invocations that would be
/// issued and the minute offsets at which the stage would run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedStage {
    pub stage_id: StageId,
    pub parallel: bool,
    pub start_minute: u32,
    pub end_minute: u32,
    pub invocations: Vec<String>,
}

/// A side-effect-free execution plan: no process is spawned and no state is
/// mutated while producing or rendering it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedPlan {
    pub runner_command: String,
    pub stages: Vec<SimulatedStage>,
    pub total_minutes: u32,
}

/// Simulate execution of an approved plan against the estimator's clock.
///
/// Stages run back to back in chain order; each stage's window is its
/// estimated duration offset by everything before it.
pub fn simulate(plan: &WorkflowPlan, config: &EstimateConfig, runner_command: &str) -> SimulatedPlan {
    let mut stages = Vec::with_capacity(plan.stages.len());
    let mut clock = 0u32;

    for stage in &plan.stages {
        let duration = config.stage_minutes(stage);
        let invocations = stage
            .items
            .iter()
            .map(|item| format!("{runner_command} {item}"))
            .collect();

        stages.push(SimulatedStage {
            stage_id: stage.id,
            parallel: stage.parallel,
            start_minute: clock,
            end_minute: clock + duration,
            invocations,
        });
        clock += duration;
    }

    SimulatedPlan {
        runner_command: runner_command.to_string(),
        stages,
        total_minutes: clock,
    }
}

pub fn render_simulation(simulated: &SimulatedPlan) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Dry run (no processes spawned):");
    for stage in &simulated.stages {
        let _ = writeln!(
            out,
            "  Stage {} ({}) t+{}m .. t+{}m:",
            stage.stage_id,
            if stage.parallel { "Parallel" } else { "Sequential" },
            stage.start_minute,
            stage.end_minute
        );
        for invocation in &stage.invocations {
            let _ = writeln!(out, "    would invoke: {invocation}");
        }
    }
    let _ = writeln!(out, "Simulated total: {} minutes", simulated.total_minutes);

    out
}
