// ABOUTME: Integration tests for the workflow execution engine
// ABOUTME: Covers stage ordering, failure cascade, cancellation, events, and conflicts

use std::sync::Arc;
use std::time::Duration;

use stagehand::engine::{
    ExecutionState, ProcessRunner, RunStatus, WorkflowEngine, WorkflowEvent,
};
use stagehand::parser::WorkflowParser;

mod common;

use common::{item, plan_from, FakeRunner};

#[tokio::test]
async fn test_all_success_produces_success_report() {
    let plan = plan_from("Run 1.1.2.1 and 1.1.2.2 in parallel, then 1.1.2.3");
    let engine = WorkflowEngine::new(Arc::new(FakeRunner::new()));

    let report = engine.execute(&plan).await.unwrap();

    assert_eq!(report.status, RunStatus::Success);
    assert!(report.success);
    assert_eq!(report.succeeded_items().len(), 3);
    assert!(report.failed_items().is_empty());
}

#[tokio::test]
async fn test_sequential_stage_runs_in_mention_order() {
    let runner = Arc::new(FakeRunner::new());
    let plan = plan_from("Run 1.1.2.1, 1.1.2.2 and 1.1.2.3 one at a time");
    let engine = WorkflowEngine::new(runner.clone());

    engine.execute(&plan).await.unwrap();

    assert_eq!(runner.invocations(), vec!["1.1.2.1", "1.1.2.2", "1.1.2.3"]);
}

#[tokio::test]
async fn test_failure_blocks_dependent_stage() {
    let runner = Arc::new(FakeRunner::new().with_failure("1.1.2.1", "exit status 2"));
    let plan = plan_from("Run 1.1.2.1 and 1.1.2.2 together, then 1.1.2.3");
    let engine = WorkflowEngine::new(runner.clone());

    let report = engine.execute(&plan).await.unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.failed_items(), vec![item("1.1.2.1")]);
    // The sibling keeps running; the dependent never starts.
    assert_eq!(report.succeeded_items(), vec![item("1.1.2.2")]);
    assert_eq!(report.blocked_items(), vec![item("1.1.2.3")]);
    assert!(!runner.invocations().contains(&"1.1.2.3".to_string()));
}

#[tokio::test]
async fn test_blocking_cascades_through_chain() {
    let runner = Arc::new(FakeRunner::new().with_failure("1.1.2.1", "boom"));
    let plan = plan_from("Run 1.1.2.1 then 1.1.2.2 then 1.1.2.3");
    let engine = WorkflowEngine::new(runner);

    let report = engine.execute(&plan).await.unwrap();

    assert_eq!(
        report.blocked_items(),
        vec![item("1.1.2.2"), item("1.1.2.3")]
    );
}

#[tokio::test]
async fn test_sequential_stage_continues_after_failure() {
    let runner = Arc::new(FakeRunner::new().with_failure("1.1.2.2", "boom"));
    let plan = plan_from("Run 1.1.2.1, 1.1.2.2 and 1.1.2.3 in sequence");
    let engine = WorkflowEngine::new(runner.clone());

    let report = engine.execute(&plan).await.unwrap();

    // Later items in the same stage still run; only dependents would block.
    assert_eq!(runner.invocations().len(), 3);
    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(
        report.succeeded_items(),
        vec![item("1.1.2.1"), item("1.1.2.3")]
    );
}

#[tokio::test]
async fn test_cancellation_sweeps_pending_items() {
    let runner = Arc::new(FakeRunner::new().with_delay("1.1.2.1", Duration::from_secs(30)));
    let plan = plan_from("Run 1.1.2.1 then 1.1.2.2 then 1.1.2.3");
    let engine = WorkflowEngine::new(runner);

    let cancel = engine.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let report = engine.execute(&plan).await.unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert!(report
        .cancelled_items()
        .contains(&item("1.1.2.1")));
    assert!(report.cancelled_items().contains(&item("1.1.2.2")));
    assert!(report.cancelled_items().contains(&item("1.1.2.3")));
    assert!(report.succeeded_items().is_empty());
}

#[tokio::test]
async fn test_completed_items_keep_state_after_cancel() {
    let runner = Arc::new(FakeRunner::new().with_delay("1.1.2.2", Duration::from_secs(30)));
    let plan = plan_from("Run 1.1.2.1 then 1.1.2.2 then 1.1.2.3");
    let engine = WorkflowEngine::new(runner);

    let cancel = engine.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    let report = engine.execute(&plan).await.unwrap();

    assert_eq!(report.status, RunStatus::Cancelled);
    assert_eq!(report.succeeded_items(), vec![item("1.1.2.1")]);
    assert!(report.cancelled_items().contains(&item("1.1.2.2")));
    assert!(report.cancelled_items().contains(&item("1.1.2.3")));
}

#[tokio::test]
async fn test_progress_events_carry_item_and_stage() {
    let plan = plan_from("Run 1.1.2.1 then 1.1.2.2");
    let engine = WorkflowEngine::new(Arc::new(FakeRunner::new()));
    let mut events = engine.subscribe();

    engine.execute(&plan).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let WorkflowEvent::Progress(progress) = event {
            seen.push((progress.item_id.to_string(), progress.stage_id));
        }
    }
    assert_eq!(
        seen,
        vec![("1.1.2.1".to_string(), 1), ("1.1.2.2".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_conflict_alert_for_related_upcoming_item() {
    let runner = Arc::new(
        FakeRunner::new().with_output("1.1.2.1", "changed the schema for the orders table"),
    );
    let plan = plan_from("Run 1.1.2.1 then 1.1.2.2");
    let engine = WorkflowEngine::new(runner);
    let mut events = engine.subscribe();

    engine.execute(&plan).await.unwrap();

    let mut alerts = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let WorkflowEvent::Conflict(alert) = event {
            alerts.push(alert);
        }
    }
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].source_item_id, item("1.1.2.1"));
    assert_eq!(alerts[0].affected_item_ids, vec![item("1.1.2.2")]);
    assert!(alerts[0].reason.contains("schema"));
}

#[tokio::test]
async fn test_no_conflict_alert_for_unrelated_prefix() {
    let runner = Arc::new(
        FakeRunner::new().with_output("1.1.2.1", "changed the schema for the orders table"),
    );
    let plan = plan_from("Run 1.1.2.1 then 9.9.1.1");
    let engine = WorkflowEngine::new(runner);
    let mut events = engine.subscribe();

    engine.execute(&plan).await.unwrap();

    let conflicts = std::iter::from_fn(|| events.try_recv().ok())
        .filter(|event| matches!(event, WorkflowEvent::Conflict(_)))
        .count();
    assert_eq!(conflicts, 0);
}

#[tokio::test]
async fn test_invalid_plan_is_rejected_before_any_run() {
    let runner = Arc::new(FakeRunner::new());
    let plan = WorkflowParser::new().parse("no identifiers in here");
    let engine = WorkflowEngine::new(runner.clone());

    let result = engine.execute(&plan).await;

    assert!(result.is_err());
    assert!(runner.invocations().is_empty());
}

#[tokio::test]
async fn test_state_snapshot_reaches_terminal_states() {
    let plan = plan_from("Run 1.1.2.1 and 1.1.2.2 together");
    let engine = WorkflowEngine::new(Arc::new(FakeRunner::new()));

    engine.execute(&plan).await.unwrap();
    let snapshot = engine.state_snapshot().await;

    assert_eq!(
        snapshot.get(&item("1.1.2.1")),
        Some(&ExecutionState::Succeeded)
    );
    assert_eq!(
        snapshot.get(&item("1.1.2.2")),
        Some(&ExecutionState::Succeeded)
    );
}

#[tokio::test]
async fn test_spawn_failure_is_absorbed_as_item_failure() {
    let runner = ProcessRunner::from_command(
        "/nonexistent/run-binary",
        Duration::from_secs(1),
    )
    .unwrap();
    let plan = plan_from("Run 1.1.2.1 then 1.1.2.2");
    let engine = WorkflowEngine::new(Arc::new(runner));

    let report = engine.execute(&plan).await.unwrap();

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.failed_items(), vec![item("1.1.2.1")]);
    assert_eq!(report.blocked_items(), vec![item("1.1.2.2")]);
}
