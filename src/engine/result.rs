// ABOUTME: Execution report types and aggregation for completed workflow runs
// ABOUTME: Per-stage item outcomes plus the rendered human-readable summary

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::Duration;

use super::state::ExecutionState;
use crate::parser::{StageId, WorkItemId};

/// How a run ended. Validation rejection never reaches a report; the report
/// only distinguishes "ran to completion", "some items failed", and
/// "intentionally stopped".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Success,
    Failed,
    Cancelled,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Item outcomes for one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub stage_id: StageId,
    pub parallel: bool,
    pub succeeded: Vec<WorkItemId>,
    pub failed: Vec<WorkItemId>,
    pub blocked: Vec<WorkItemId>,
    pub cancelled: Vec<WorkItemId>,
}

impl StageReport {
    pub fn new(stage_id: StageId, parallel: bool) -> Self {
        Self {
            stage_id,
            parallel,
            ..Self::default()
        }
    }

    pub fn record(&mut self, item: WorkItemId, state: ExecutionState) {
        match state {
            ExecutionState::Succeeded => self.succeeded.push(item),
            ExecutionState::Failed => self.failed.push(item),
            ExecutionState::Blocked => self.blocked.push(item),
            ExecutionState::Cancelled => self.cancelled.push(item),
            // Pending/Running never appear in a final report.
            ExecutionState::Pending | ExecutionState::Running => {}
        }
    }
}

/// Final structured report for one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub run_id: String,
    pub status: RunStatus,
    pub success: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub elapsed: Duration,
    pub stages: Vec<StageReport>,
    /// Accumulated output per item, kept separate per concurrent stream.
    pub outputs: HashMap<WorkItemId, String>,
}

impl ExecutionReport {
    pub fn elapsed_minutes(&self) -> f64 {
        self.elapsed.as_secs_f64() / 60.0
    }

    pub fn failed_items(&self) -> Vec<WorkItemId> {
        self.stages
            .iter()
            .flat_map(|stage| stage.failed.iter().cloned())
            .collect()
    }

    pub fn blocked_items(&self) -> Vec<WorkItemId> {
        self.stages
            .iter()
            .flat_map(|stage| stage.blocked.iter().cloned())
            .collect()
    }

    pub fn cancelled_items(&self) -> Vec<WorkItemId> {
        self.stages
            .iter()
            .flat_map(|stage| stage.cancelled.iter().cloned())
            .collect()
    }

    pub fn succeeded_items(&self) -> Vec<WorkItemId> {
        self.stages
            .iter()
            .flat_map(|stage| stage.succeeded.iter().cloned())
            .collect()
    }

    /// Human-readable summary. Cancellation is reported distinctly from
    /// failure: "intentionally stopped" vs "started but some items failed".
    pub fn render_summary(&self) -> String {
        let mut out = String::new();

        let headline = match self.status {
            RunStatus::Success => "Workflow completed successfully",
            RunStatus::Failed => "Workflow started but some items failed",
            RunStatus::Cancelled => "Workflow intentionally stopped",
        };
        let _ = writeln!(
            out,
            "{} in {:.1} minutes (run {})",
            headline,
            self.elapsed_minutes(),
            self.run_id
        );

        for stage in &self.stages {
            let _ = writeln!(
                out,
                "  Stage {} ({}):",
                stage.stage_id,
                if stage.parallel { "Parallel" } else { "Sequential" }
            );
            for (label, items) in [
                ("succeeded", &stage.succeeded),
                ("failed", &stage.failed),
                ("blocked", &stage.blocked),
                ("cancelled", &stage.cancelled),
            ] {
                if !items.is_empty() {
                    let names: Vec<String> = items.iter().map(ToString::to_string).collect();
                    let _ = writeln!(out, "    {label}: {}", names.join(", "));
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> WorkItemId {
        s.parse().unwrap()
    }

    fn report(status: RunStatus, stages: Vec<StageReport>) -> ExecutionReport {
        ExecutionReport {
            run_id: "run_test".to_string(),
            status,
            success: status == RunStatus::Success,
            start_time: Utc::now(),
            end_time: Utc::now(),
            elapsed: Duration::from_secs(90),
            stages,
            outputs: HashMap::new(),
        }
    }

    #[test]
    fn test_stage_report_records_terminal_states() {
        let mut stage = StageReport::new(1, true);
        stage.record(id("1.1.2.1"), ExecutionState::Succeeded);
        stage.record(id("1.1.2.2"), ExecutionState::Failed);
        stage.record(id("1.1.2.3"), ExecutionState::Pending);

        assert_eq!(stage.succeeded, vec![id("1.1.2.1")]);
        assert_eq!(stage.failed, vec![id("1.1.2.2")]);
        assert!(stage.blocked.is_empty());
    }

    #[test]
    fn test_item_rollups_across_stages() {
        let mut first = StageReport::new(1, false);
        first.record(id("1.1.2.1"), ExecutionState::Failed);
        let mut second = StageReport::new(2, false);
        second.record(id("1.1.2.2"), ExecutionState::Blocked);

        let report = report(RunStatus::Failed, vec![first, second]);

        assert_eq!(report.failed_items(), vec![id("1.1.2.1")]);
        assert_eq!(report.blocked_items(), vec![id("1.1.2.2")]);
        assert!(!report.success);
    }

    #[test]
    fn test_summary_distinguishes_outcomes() {
        let success = report(RunStatus::Success, vec![]);
        assert!(success.render_summary().contains("completed successfully"));

        let failed = report(RunStatus::Failed, vec![]);
        assert!(failed.render_summary().contains("some items failed"));

        let cancelled = report(RunStatus::Cancelled, vec![]);
        assert!(cancelled.render_summary().contains("intentionally stopped"));
    }

    #[test]
    fn test_elapsed_minutes() {
        let summary = report(RunStatus::Success, vec![]);
        assert!((summary.elapsed_minutes() - 1.5).abs() < f64::EPSILON);
    }
}
