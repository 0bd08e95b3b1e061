// ABOUTME: Parser module turning free-text descriptions into validated workflow plans
// ABOUTME: Exports identifier extraction, segment classification, stage building, and validation

pub mod confirm;
pub mod error;
pub mod estimate;
pub mod extract;
pub mod graph;
pub mod segment;
pub mod stage;
pub mod validation;

pub use confirm::{render_confirmation, render_simulation, simulate, SimulatedPlan, SimulatedStage};
pub use error::{ParserError, ValidationError};
pub use estimate::{Estimate, EstimateConfig};
pub use extract::{extract_ids, WorkItemId};
pub use graph::{CycleReport, DependencyGraph};
pub use segment::{Segment, SegmentClassifier};
pub use stage::{Stage, StageBuilder, StageId, WorkflowPlan};
pub use validation::{PlanValidator, ValidationReport};

use tracing::debug;

/// Runs the full parse pipeline: extract identifiers, classify segments,
/// build stages, validate, estimate.
///
/// Parsing is total: bad input comes back as a plan carrying validation
/// errors rather than an `Err`, so callers always have something to render.
/// Parsing the same description twice yields structurally identical plans.
#[derive(Debug, Clone, Default)]
pub struct WorkflowParser {
    classifier: SegmentClassifier,
    builder: StageBuilder,
    validator: PlanValidator,
    estimate_config: EstimateConfig,
}

impl WorkflowParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_estimate_config(mut self, config: EstimateConfig) -> Self {
        self.estimate_config = config;
        self
    }

    pub fn parse(&self, description: &str) -> WorkflowPlan {
        let ids = extract_ids(description);
        let segments = self.classifier.classify(description);
        let stages = self.builder.build(&segments);

        debug!(
            "Parsed description into {} id(s), {} segment(s), {} stage(s)",
            ids.len(),
            segments.len(),
            stages.len()
        );

        let report = self.validator.validate(description, &ids, &stages);
        let estimate = self.estimate_config.estimate(&stages);
        let total_item_count = stages.iter().map(|stage| stage.items.len()).sum();

        WorkflowPlan {
            stages,
            total_item_count,
            estimated_duration_minutes: estimate.total_minutes,
            peak_concurrency: estimate.peak_concurrency,
            validation_errors: report.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_idempotent() {
        let parser = WorkflowParser::new();
        let text = "Run 1.1.2.1 and 1.1.2.2 together, then 1.1.2.3";

        let first = parser.parse(text);
        let second = parser.parse(text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_produces_executable_plan() {
        let plan = WorkflowParser::new().parse("Run 1.1.2.1 then 1.1.2.2 then 1.1.2.3");

        assert!(plan.is_executable());
        assert_eq!(plan.stages.len(), 3);
        assert_eq!(plan.total_item_count, 3);
        assert_eq!(plan.estimated_duration_minutes, 45);
        assert_eq!(plan.peak_concurrency, 12);
    }

    #[test]
    fn test_parse_bad_input_is_total() {
        let plan = WorkflowParser::new().parse("");

        assert!(!plan.is_executable());
        assert!(!plan.validation_errors.is_empty());
        assert!(plan.stages.is_empty());
    }

    #[test]
    fn test_custom_estimates_flow_through() {
        let config = EstimateConfig {
            per_item_minutes: 10,
            parallel_overhead_minutes: 5,
            agents_per_item: 2,
        };
        let plan = WorkflowParser::new()
            .with_estimate_config(config)
            .parse("Run 1.1.2.1 and 1.1.2.2 in parallel");

        assert_eq!(plan.estimated_duration_minutes, 20);
        assert_eq!(plan.peak_concurrency, 4);
    }
}
