// ABOUTME: Stage and workflow plan data structures plus the stage builder
// ABOUTME: Converts classified segments into an ordered, linearly chained stage list

use serde::{Deserialize, Serialize};

use super::extract::WorkItemId;
use super::segment::Segment;

pub type StageId = u32;

/// The unit of scheduling: an ordered set of work items sharing an execution
/// mode and prerequisites. Immutable once built; read-only during execution.
///
/// A non-parallel stage may still hold several items; they execute strictly
/// one at a time in mention order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub items: Vec<WorkItemId>,
    pub parallel: bool,
    pub depends_on: Vec<StageId>,
}

impl Stage {
    pub fn mode_label(&self) -> &'static str {
        if self.parallel {
            "Parallel"
        } else {
            "Sequential"
        }
    }

    pub fn contains(&self, item: &WorkItemId) -> bool {
        self.items.contains(item)
    }
}

/// The validated, immutable output of parsing and the sole input contract to
/// the execution engine. A plan with validation errors must never execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPlan {
    pub stages: Vec<Stage>,
    pub total_item_count: usize,
    pub estimated_duration_minutes: u32,
    pub peak_concurrency: u32,
    pub validation_errors: Vec<String>,
}

impl WorkflowPlan {
    pub fn is_executable(&self) -> bool {
        self.validation_errors.is_empty() && !self.stages.is_empty()
    }

    /// All work items across stages, in stage order.
    pub fn all_items(&self) -> Vec<WorkItemId> {
        self.stages
            .iter()
            .flat_map(|stage| stage.items.iter().cloned())
            .collect()
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|stage| stage.id == id)
    }
}

/// Builds stages from classified segments.
///
/// Each segment becomes one stage depending on the previous segment's stage
/// (the first depends on nothing). Dependencies are strictly linear; the
/// builder never infers semantic relationships between items.
#[derive(Debug, Clone, Default)]
pub struct StageBuilder;

impl StageBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn build(&self, segments: &[Segment]) -> Vec<Stage> {
        segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                let id = (index + 1) as StageId;
                let depends_on = if index == 0 { vec![] } else { vec![id - 1] };

                Stage {
                    id,
                    items: segment.items.clone(),
                    parallel: segment.parallel,
                    depends_on,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(ids: &[&str], parallel: bool) -> Segment {
        Segment {
            text: ids.join(" "),
            items: ids.iter().map(|id| id.parse().unwrap()).collect(),
            parallel,
        }
    }

    #[test]
    fn test_sequential_chain_graph() {
        let segments = vec![
            segment(&["1.1.2.1"], false),
            segment(&["1.1.2.2"], false),
            segment(&["1.1.2.3"], false),
        ];

        let stages = StageBuilder::new().build(&segments);

        assert_eq!(stages.len(), 3);
        assert!(stages[0].depends_on.is_empty());
        assert_eq!(stages[1].depends_on, vec![1]);
        assert_eq!(stages[2].depends_on, vec![2]);
        assert!(stages.iter().all(|s| !s.parallel && s.items.len() == 1));
    }

    #[test]
    fn test_single_wide_node() {
        let segments = vec![segment(&["1.1.2.1", "1.1.2.2", "1.1.2.3"], true)];

        let stages = StageBuilder::new().build(&segments);

        assert_eq!(stages.len(), 1);
        assert!(stages[0].parallel);
        assert_eq!(stages[0].items.len(), 3);
        assert!(stages[0].depends_on.is_empty());
    }

    #[test]
    fn test_mixed_interleaving() {
        let segments = vec![
            segment(&["1.1.2.1", "1.1.2.2"], true),
            segment(&["1.1.2.3"], false),
        ];

        let stages = StageBuilder::new().build(&segments);

        assert_eq!(stages.len(), 2);
        assert!(stages[0].parallel);
        assert_eq!(stages[1].depends_on, vec![1]);
    }

    #[test]
    fn test_empty_segments_give_empty_plan() {
        assert!(StageBuilder::new().build(&[]).is_empty());
    }
}
