// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Provides a scripted fake runner and workflow plan builders

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use stagehand::engine::{CancelToken, EventBus, ItemRun, ItemRunner, RunOutcome};
use stagehand::parser::{StageId, WorkItemId, WorkflowParser, WorkflowPlan};

/// Scripted stand-in for the external execution engine. Each item id can be
/// given an outcome and a delay; unscripted items succeed immediately.
pub struct FakeRunner {
    outcomes: HashMap<String, RunOutcome>,
    delays: HashMap<String, Duration>,
    outputs: HashMap<String, String>,
    invocations: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self {
            outcomes: HashMap::new(),
            delays: HashMap::new(),
            outputs: HashMap::new(),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn with_failure(mut self, item: &str, reason: &str) -> Self {
        self.outcomes.insert(
            item.to_string(),
            RunOutcome::Failure {
                reason: reason.to_string(),
            },
        );
        self
    }

    pub fn with_delay(mut self, item: &str, delay: Duration) -> Self {
        self.delays.insert(item.to_string(), delay);
        self
    }

    pub fn with_output(mut self, item: &str, output: &str) -> Self {
        self.outputs.insert(item.to_string(), output.to_string());
        self
    }

    /// Item ids in the order the runner was asked to execute them.
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemRunner for FakeRunner {
    async fn run(
        &self,
        item: &WorkItemId,
        stage_id: StageId,
        bus: &EventBus,
        cancel: &CancelToken,
    ) -> stagehand::engine::error::Result<ItemRun> {
        let key = item.to_string();
        self.invocations.lock().unwrap().push(key.clone());

        bus.publish_progress(item.clone(), stage_id, format!("working on {}", key));

        if let Some(delay) = self.delays.get(&key) {
            tokio::select! {
                _ = tokio::time::sleep(*delay) => {}
                _ = cancel.cancelled() => {
                    return Ok(ItemRun {
                        outcome: RunOutcome::Cancelled,
                        output: format!("{} interrupted", key),
                    });
                }
            }
        }

        let outcome = self
            .outcomes
            .get(&key)
            .cloned()
            .unwrap_or(RunOutcome::Success);
        let output = self
            .outputs
            .get(&key)
            .cloned()
            .unwrap_or_else(|| format!("{} done", key));

        Ok(ItemRun { outcome, output })
    }
}

/// Parse a description into a plan, panicking if it is not executable.
pub fn plan_from(description: &str) -> WorkflowPlan {
    let plan = WorkflowParser::new().parse(description);
    assert!(
        plan.is_executable(),
        "expected executable plan, got errors: {:?}",
        plan.validation_errors
    );
    plan
}

pub fn item(id: &str) -> WorkItemId {
    id.parse().unwrap()
}
