// ABOUTME: Workflow execution engine supervising stage-by-stage item runs
// ABOUTME: Enforces dependency order, cascades failure into blocking, handles cancellation

use chrono::Utc;
use futures::future;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, instrument, warn};

use super::error::{ExecutionError, Result};
use super::events::{CancelToken, EventBus, WorkflowEvent};
use super::result::{ExecutionReport, RunStatus, StageReport};
use super::runner::{ItemRunner, RunOutcome};
use super::state::{ExecutionState, StateStore};
use super::watcher::ConflictWatcher;
use crate::parser::{Stage, StageId, WorkItemId, WorkflowPlan};

/// Drives one approved plan to completion.
///
/// The engine owns the only write path into the per-item state table; the
/// plan itself is read-only from the moment it is handed in. Observers
/// subscribe to the event bus before calling [`WorkflowEngine::execute`]
/// and read state through snapshots.
pub struct WorkflowEngine {
    runner: Arc<dyn ItemRunner>,
    store: StateStore,
    bus: EventBus,
    watcher: ConflictWatcher,
    cancel: CancelToken,
}

impl WorkflowEngine {
    pub fn new(runner: Arc<dyn ItemRunner>) -> Self {
        Self {
            runner,
            store: StateStore::new(),
            bus: EventBus::default(),
            watcher: ConflictWatcher::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Token observers or signal handlers use to request cancellation.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<WorkflowEvent> {
        self.bus.subscribe()
    }

    /// Read-only view of the current state table.
    pub async fn state_snapshot(&self) -> HashMap<WorkItemId, ExecutionState> {
        self.store.snapshot().await
    }

    /// Execute an approved plan.
    ///
    /// A plan carrying validation errors is rejected before anything starts.
    /// Runtime item failures are absorbed into the report, never returned as
    /// `Err`; only infrastructure problems (task join failures) are.
    #[instrument(skip(self, plan), fields(stages = plan.stages.len()))]
    pub async fn execute(&self, plan: &WorkflowPlan) -> Result<ExecutionReport> {
        if !plan.validation_errors.is_empty() {
            return Err(ExecutionError::InvalidPlan {
                reasons: plan.validation_errors.clone(),
            });
        }
        if plan.stages.is_empty() {
            return Err(ExecutionError::InvalidPlan {
                reasons: vec!["Plan contains no stages".to_string()],
            });
        }

        let run_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        let start_time = Utc::now();

        info!(
            "Starting execution: {} stage(s), {} item(s) (run {})",
            plan.stages.len(),
            plan.total_item_count,
            run_id
        );

        self.store.init(&plan.all_items()).await;

        let mut stage_success: HashMap<StageId, bool> = HashMap::new();
        let mut outputs: HashMap<WorkItemId, String> = HashMap::new();

        for (index, stage) in plan.stages.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }

            // A stage starts only once everything it depends on settled
            // successfully; otherwise its items are blocked, which in turn
            // blocks everything depending on this stage.
            let prerequisites_met = stage
                .depends_on
                .iter()
                .all(|dep| stage_success.get(dep).copied().unwrap_or(false));

            if !prerequisites_met {
                warn!("Stage {} blocked by failed prerequisites", stage.id);
                for item in &stage.items {
                    self.store.set(item, ExecutionState::Blocked).await;
                }
                stage_success.insert(stage.id, false);
                continue;
            }

            // Items of stages that have not started yet, for the watcher.
            let upcoming: Vec<WorkItemId> = plan.stages[index + 1..]
                .iter()
                .flat_map(|later| later.items.iter().cloned())
                .collect();

            info!(
                "Executing stage {}/{} ({}, {} item(s))",
                stage.id,
                plan.stages.len(),
                stage.mode_label(),
                stage.items.len()
            );

            let success = if stage.parallel {
                self.run_parallel_stage(stage, &upcoming, &mut outputs).await
            } else {
                self.run_sequential_stage(stage, &upcoming, &mut outputs).await
            };
            stage_success.insert(stage.id, success);
        }

        // Anything never scheduled when a cancel arrives is cancelled, not
        // blocked; items already terminal keep their state.
        if self.cancel.is_cancelled() {
            let swept = self
                .store
                .sweep(ExecutionState::Pending, ExecutionState::Cancelled)
                .await;
            if !swept.is_empty() {
                info!("Cancelled {} unscheduled item(s)", swept.len());
            }
        }

        let report = self
            .assemble_report(plan, run_id, start_time, started, outputs)
            .await;

        info!(
            "Execution finished with status {} in {:.1} minutes",
            report.status,
            report.elapsed_minutes()
        );

        Ok(report)
    }

    /// Fan out every item in the stage concurrently and wait for all of
    /// them to settle. Sibling items keep running even when one fails;
    /// failure only affects dependent stages.
    async fn run_parallel_stage(
        &self,
        stage: &Stage,
        upcoming: &[WorkItemId],
        outputs: &mut HashMap<WorkItemId, String>,
    ) -> bool {
        let runs = stage.items.iter().map(|item| {
            let item = item.clone();
            async move {
                let (state, output) = self.run_item(&item, stage.id, upcoming).await;
                (item, state, output)
            }
        });

        let mut all_succeeded = true;
        for (item, state, output) in future::join_all(runs).await {
            if state != ExecutionState::Succeeded {
                all_succeeded = false;
            }
            if let Some(output) = output {
                outputs.insert(item, output);
            }
        }
        all_succeeded
    }

    /// Run items strictly one at a time in mention order. Each item waits
    /// for the previous to reach a terminal state; a failure does not stop
    /// the remaining items, it only settles the stage as failed.
    async fn run_sequential_stage(
        &self,
        stage: &Stage,
        upcoming: &[WorkItemId],
        outputs: &mut HashMap<WorkItemId, String>,
    ) -> bool {
        let mut all_succeeded = true;

        for item in &stage.items {
            if self.cancel.is_cancelled() {
                // Remaining items stay pending; the final sweep marks them
                // cancelled.
                all_succeeded = false;
                break;
            }

            let (state, output) = self.run_item(item, stage.id, upcoming).await;
            if state != ExecutionState::Succeeded {
                all_succeeded = false;
            }
            if let Some(output) = output {
                outputs.insert(item.clone(), output);
            }
        }

        all_succeeded
    }

    /// Run one item through the runner and record its terminal state.
    /// Runner-level errors (spawn failures) are absorbed as item failures.
    async fn run_item(
        &self,
        item: &WorkItemId,
        stage_id: StageId,
        upcoming: &[WorkItemId],
    ) -> (ExecutionState, Option<String>) {
        if self.cancel.is_cancelled() {
            self.store.set(item, ExecutionState::Cancelled).await;
            return (ExecutionState::Cancelled, None);
        }

        self.store.set(item, ExecutionState::Running).await;

        match self.runner.run(item, stage_id, &self.bus, &self.cancel).await {
            Ok(run) => {
                let state = match run.outcome {
                    RunOutcome::Success => ExecutionState::Succeeded,
                    RunOutcome::Failure { ref reason } => {
                        error!("Item {} failed: {}", item, reason);
                        ExecutionState::Failed
                    }
                    RunOutcome::Cancelled => ExecutionState::Cancelled,
                };
                self.store.set(item, state).await;

                if state == ExecutionState::Succeeded {
                    if let Some(alert) = self.watcher.inspect(item, &run.output, upcoming) {
                        info!(
                            "Conflict alert from {}: {} candidate(s)",
                            item,
                            alert.affected_item_ids.len()
                        );
                        self.bus.publish_conflict(alert);
                    }
                }

                (state, Some(run.output))
            }
            Err(err) => {
                error!("Runner error for item {}: {}", item, err);
                self.store.set(item, ExecutionState::Failed).await;
                (ExecutionState::Failed, None)
            }
        }
    }

    async fn assemble_report(
        &self,
        plan: &WorkflowPlan,
        run_id: String,
        start_time: chrono::DateTime<Utc>,
        started: Instant,
        outputs: HashMap<WorkItemId, String>,
    ) -> ExecutionReport {
        let snapshot = self.store.snapshot().await;

        let mut stages = Vec::with_capacity(plan.stages.len());
        let mut any_failed_or_blocked = false;
        let mut any_cancelled = false;

        for stage in &plan.stages {
            let mut stage_report = StageReport::new(stage.id, stage.parallel);
            for item in &stage.items {
                let state = snapshot
                    .get(item)
                    .copied()
                    .unwrap_or(ExecutionState::Pending);
                match state {
                    ExecutionState::Failed | ExecutionState::Blocked => {
                        any_failed_or_blocked = true
                    }
                    ExecutionState::Cancelled => any_cancelled = true,
                    _ => {}
                }
                stage_report.record(item.clone(), state);
            }
            stages.push(stage_report);
        }

        let status = if any_cancelled {
            RunStatus::Cancelled
        } else if any_failed_or_blocked {
            RunStatus::Failed
        } else {
            RunStatus::Success
        };

        ExecutionReport {
            run_id,
            status,
            success: status == RunStatus::Success,
            start_time,
            end_time: Utc::now(),
            elapsed: started.elapsed(),
            stages,
            outputs,
        }
    }
}
