// ABOUTME: Error types for workflow description parsing and plan validation
// ABOUTME: Defines specific error types for parser module operations

use thiserror::Error;

use super::extract::WorkItemId;

#[derive(Error, Debug, Clone)]
pub enum ParserError {
    #[error("Invalid work item id: '{0}' (expected 4-6 dotted numeric segments)")]
    InvalidItemId(String),

    #[error("Description is empty or whitespace")]
    EmptyDescription,

    #[error("No work item identifiers found in description")]
    NoItemsFound,

    #[error("Validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

#[derive(Error, Debug, Clone)]
pub enum ValidationError {
    #[error("Circular dependency detected in stages: {stages:?}")]
    CircularDependency { stages: Vec<u32> },

    #[error("Stage {stage} depends on unknown stage {dependency}")]
    UnknownDependency { stage: u32, dependency: u32 },

    #[error("Stage {stage} contains no work items")]
    EmptyStage { stage: u32 },

    #[error("Work item {item} appears in more than one stage")]
    DuplicateItem { item: WorkItemId },
}

pub type Result<T> = std::result::Result<T, ParserError>;
