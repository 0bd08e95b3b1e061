// ABOUTME: Plan-level validation producing the errors carried on a WorkflowPlan
// ABOUTME: Covers empty input, missing identifiers, unknown dependencies, and cycles

use std::collections::HashSet;
use tracing::debug;

use super::error::{ParserError, ValidationError};
use super::extract::WorkItemId;
use super::graph::DependencyGraph;
use super::stage::{Stage, StageId};

/// Accumulated validation findings for one parse.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub has_circular: bool,
    pub cycle_members: Vec<StageId>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates raw input and the built stage list before a plan is assembled.
///
/// Findings are reported as plain strings so they can be carried verbatim on
/// the plan and rendered in the confirmation; execution refuses any plan
/// with a non-empty error list.
#[derive(Debug, Clone, Default)]
pub struct PlanValidator;

impl PlanValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        description: &str,
        ids: &[WorkItemId],
        stages: &[Stage],
    ) -> ValidationReport {
        let mut report = ValidationReport::default();

        if description.trim().is_empty() {
            report.errors.push(ParserError::EmptyDescription.to_string());
            return report;
        }

        if ids.is_empty() {
            report.errors.push(ParserError::NoItemsFound.to_string());
            return report;
        }

        // Structural checks run per stage; the graph itself is built from
        // whatever remains checkable.
        let mut assigned: HashSet<&WorkItemId> = HashSet::new();
        for stage in stages {
            if stage.items.is_empty() {
                report
                    .errors
                    .push(ValidationError::EmptyStage { stage: stage.id }.to_string());
            }
            for item in &stage.items {
                if !assigned.insert(item) {
                    report
                        .errors
                        .push(ValidationError::DuplicateItem { item: item.clone() }.to_string());
                }
            }
            for &dependency in &stage.depends_on {
                if !stages.iter().any(|candidate| candidate.id == dependency) {
                    report.errors.push(
                        ValidationError::UnknownDependency {
                            stage: stage.id,
                            dependency,
                        }
                        .to_string(),
                    );
                }
            }
        }
        if !report.errors.is_empty() {
            return report;
        }

        match DependencyGraph::from_stages(stages) {
            Ok(graph) => {
                let cycle = graph.detect_cycle();
                if cycle.has_circular {
                    report.has_circular = true;
                    report.cycle_members = cycle.members.clone();
                    report.errors.push(
                        ValidationError::CircularDependency {
                            stages: cycle.members,
                        }
                        .to_string(),
                    );
                }
            }
            Err(error) => {
                debug!("Graph construction failed during validation: {}", error);
                report.errors.push(error.to_string());
            }
        }

        report
    }
}
