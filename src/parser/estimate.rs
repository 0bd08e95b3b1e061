// ABOUTME: Duration and concurrency projections for workflow plans
// ABOUTME: Tunable per-item baseline, parallel coordination overhead, and agent fan-out

use serde::{Deserialize, Serialize};

use super::stage::Stage;

/// Tunable estimation constants. The defaults model the external engine's
/// observed behavior: a flat per-item baseline, a small coordination cost per
/// concurrent item (no wall-clock speedup is assumed), and an opaque number
/// of internal sub-workers the engine runs per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateConfig {
    #[serde(default = "default_per_item_minutes")]
    pub per_item_minutes: u32,
    #[serde(default = "default_parallel_overhead_minutes")]
    pub parallel_overhead_minutes: u32,
    #[serde(default = "default_agents_per_item")]
    pub agents_per_item: u32,
}

fn default_per_item_minutes() -> u32 {
    15
}

fn default_parallel_overhead_minutes() -> u32 {
    2
}

fn default_agents_per_item() -> u32 {
    12
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            per_item_minutes: default_per_item_minutes(),
            parallel_overhead_minutes: default_parallel_overhead_minutes(),
            agents_per_item: default_agents_per_item(),
        }
    }
}

/// Computed projection for a whole plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    pub total_minutes: u32,
    pub peak_concurrency: u32,
}

impl EstimateConfig {
    /// Duration of a single stage in minutes.
    ///
    /// Sequential stages sum the per-item baseline. Parallel stages pay the
    /// baseline once plus a coordination overhead per concurrent item.
    pub fn stage_minutes(&self, stage: &Stage) -> u32 {
        let count = stage.items.len() as u32;
        if count == 0 {
            return 0;
        }

        if stage.parallel {
            self.per_item_minutes + self.parallel_overhead_minutes * count
        } else {
            self.per_item_minutes * count
        }
    }

    /// Total duration and peak concurrency across a stage chain.
    pub fn estimate(&self, stages: &[Stage]) -> Estimate {
        let total_minutes = stages.iter().map(|stage| self.stage_minutes(stage)).sum();

        let peak_concurrency = stages
            .iter()
            .map(|stage| stage.items.len() as u32 * self.agents_per_item)
            .max()
            .unwrap_or(0);

        Estimate {
            total_minutes,
            peak_concurrency,
        }
    }
}
