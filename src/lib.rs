// ABOUTME: Main library module for the stagehand workflow scheduler
// ABOUTME: Exports all core modules and provides the public API

pub mod cli;
pub mod engine;
pub mod parser;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use engine::{
    ExecutionReport, ExecutionState, ItemRunner, ProcessRunner, RunStatus, WorkflowEngine,
    WorkflowEvent,
};
pub use parser::{Stage, WorkItemId, WorkflowParser, WorkflowPlan};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
