// ABOUTME: Execution engine module for stagehand
// ABOUTME: Supervises external per-item runs with state tracking, events, and cancellation

pub mod error;
pub mod events;
pub mod executor;
pub mod result;
pub mod runner;
pub mod state;
pub mod watcher;

pub use error::{ExecutionError, Result};
pub use events::{CancelToken, ConflictAlert, EventBus, ProgressEvent, WorkflowEvent};
pub use executor::WorkflowEngine;
pub use result::{ExecutionReport, RunStatus, StageReport};
pub use runner::{ItemRun, ItemRunner, ProcessRunner, RunOutcome};
pub use state::{ExecutionState, StateStore};
pub use watcher::ConflictWatcher;
