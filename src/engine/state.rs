// ABOUTME: Per-item execution state table owned by the engine
// ABOUTME: Observers read immutable snapshots; only the engine writes transitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::parser::WorkItemId;

/// Lifecycle of one work item. All items start `Pending`; everything except
/// `Pending` and `Running` is terminal.
///
/// `Blocked` is assigned only when an item's stage is never started because
/// a prerequisite stage did not fully succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Blocked,
    Cancelled,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExecutionState::Pending | ExecutionState::Running)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExecutionState::Pending => "pending",
            ExecutionState::Running => "running",
            ExecutionState::Succeeded => "succeeded",
            ExecutionState::Failed => "failed",
            ExecutionState::Blocked => "blocked",
            ExecutionState::Cancelled => "cancelled",
        };
        write!(f, "{label}")
    }
}

/// State table keyed by work item id.
///
/// Cloning shares the underlying table; the engine holds the only writer
/// path while observers use [`StateStore::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct StateStore {
    inner: Arc<RwLock<HashMap<WorkItemId, ExecutionState>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every item as `Pending`. Called once before execution.
    pub async fn init(&self, items: &[WorkItemId]) {
        let mut table = self.inner.write().await;
        table.clear();
        for item in items {
            table.insert(item.clone(), ExecutionState::Pending);
        }
    }

    pub async fn set(&self, item: &WorkItemId, state: ExecutionState) {
        debug!("State transition: {} -> {}", item, state);
        let mut table = self.inner.write().await;
        table.insert(item.clone(), state);
    }

    pub async fn get(&self, item: &WorkItemId) -> Option<ExecutionState> {
        let table = self.inner.read().await;
        table.get(item).copied()
    }

    /// Transition every item currently in `from` to `to`, returning the
    /// items that moved. Used for the cancellation sweep.
    pub async fn sweep(&self, from: ExecutionState, to: ExecutionState) -> Vec<WorkItemId> {
        let mut table = self.inner.write().await;
        let mut moved = Vec::new();
        for (item, state) in table.iter_mut() {
            if *state == from {
                *state = to;
                moved.push(item.clone());
            }
        }
        moved
    }

    /// Read-only copy of the whole table for observers.
    pub async fn snapshot(&self) -> HashMap<WorkItemId, ExecutionState> {
        let table = self.inner.read().await;
        table.clone()
    }

    pub async fn count(&self, state: ExecutionState) -> usize {
        let table = self.inner.read().await;
        table.values().filter(|&&s| s == state).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> WorkItemId {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_init_marks_all_pending() {
        let store = StateStore::new();
        store.init(&[id("1.1.2.1"), id("1.1.2.2")]).await;

        assert_eq!(store.get(&id("1.1.2.1")).await, Some(ExecutionState::Pending));
        assert_eq!(store.count(ExecutionState::Pending).await, 2);
    }

    #[tokio::test]
    async fn test_transitions_and_snapshot() {
        let store = StateStore::new();
        store.init(&[id("1.1.2.1")]).await;

        store.set(&id("1.1.2.1"), ExecutionState::Running).await;
        store.set(&id("1.1.2.1"), ExecutionState::Succeeded).await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot[&id("1.1.2.1")], ExecutionState::Succeeded);
    }

    #[tokio::test]
    async fn test_sweep_moves_only_matching() {
        let store = StateStore::new();
        store
            .init(&[id("1.1.2.1"), id("1.1.2.2"), id("1.1.2.3")])
            .await;
        store.set(&id("1.1.2.1"), ExecutionState::Succeeded).await;

        let moved = store
            .sweep(ExecutionState::Pending, ExecutionState::Cancelled)
            .await;

        assert_eq!(moved.len(), 2);
        assert_eq!(store.get(&id("1.1.2.1")).await, Some(ExecutionState::Succeeded));
        assert_eq!(store.count(ExecutionState::Cancelled).await, 2);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ExecutionState::Pending.is_terminal());
        assert!(!ExecutionState::Running.is_terminal());
        assert!(ExecutionState::Succeeded.is_terminal());
        assert!(ExecutionState::Blocked.is_terminal());
        assert!(ExecutionState::Cancelled.is_terminal());
    }
}
