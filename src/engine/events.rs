// ABOUTME: Progress and conflict event publishing plus cooperative cancellation
// ABOUTME: Broadcast channel for observers and a clonable cancel token for item tasks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

use crate::parser::{StageId, WorkItemId};

/// One line of output from a running item, tagged with its stage.
/// Ephemeral: consumed by subscribers, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub item_id: WorkItemId,
    pub stage_id: StageId,
    pub text_chunk: String,
    pub timestamp: DateTime<Utc>,
}

/// Advisory notice that a completed item may impact later-stage items.
/// Never blocks execution on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictAlert {
    pub source_item_id: WorkItemId,
    pub affected_item_ids: Vec<WorkItemId>,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowEvent {
    Progress(ProgressEvent),
    Conflict(ConflictAlert),
}

/// Subscribe/notify channel for observers. Consumers attach before execution
/// starts to receive the complete stream; publishing with no subscribers is
/// not an error.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<WorkflowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.sender.subscribe()
    }

    pub fn publish_progress(&self, item_id: WorkItemId, stage_id: StageId, text_chunk: String) {
        let event = WorkflowEvent::Progress(ProgressEvent {
            item_id,
            stage_id,
            text_chunk,
            timestamp: Utc::now(),
        });
        let _ = self.sender.send(event);
    }

    pub fn publish_conflict(&self, alert: ConflictAlert) {
        let _ = self.sender.send(WorkflowEvent::Conflict(alert));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Cooperative cancellation token shared by the coordinator and every item
/// task. Cancelling is sticky and idempotent.
#[derive(Debug, Clone)]
pub struct CancelToken {
    receiver: watch::Receiver<bool>,
    sender: std::sync::Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            receiver,
            sender: std::sync::Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested. Used inside `select!` arms
    /// supervising child processes.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        while !*receiver.borrow() {
            if receiver.changed().await.is_err() {
                // Sender dropped without cancelling; treat as never-cancelled
                // and park until the task itself is dropped.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
