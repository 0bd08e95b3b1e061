// ABOUTME: Error types for the workflow execution engine
// ABOUTME: Defines specific error types for plan supervision and item runner failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Plan rejected: {reasons:?}")]
    InvalidPlan { reasons: Vec<String> },

    #[error("Runner failed to start item {item_id}: {message}")]
    RunnerSpawn { item_id: String, message: String },

    #[error("Runner command is empty")]
    EmptyRunnerCommand,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Join error: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ExecutionError>;
