// ABOUTME: Advisory conflict watcher run after each successful item
// ABOUTME: Keyword-category heuristic flagging later-stage items that may be impacted

use chrono::Utc;
use tracing::debug;

use super::events::ConflictAlert;
use crate::parser::WorkItemId;

/// Keyword categories that suggest a change with cross-item impact.
const CATEGORIES: &[(&str, &[&str])] = &[
    ("schema", &["schema", "migration", "table", "column"]),
    ("interface", &["interface", "signature", "endpoint", "api"]),
    ("contract", &["contract", "protocol", "breaking change"]),
    ("configuration", &["config", "environment variable", "feature flag"]),
];

/// Id segments two items must share to count as the same feature area.
const PREFIX_DEPTH: usize = 2;

/// Watches completed items for changes that may affect work not yet started.
///
/// Purely advisory: finding nothing, or failing to compute, produces no
/// alert and never affects scheduling.
#[derive(Debug, Clone, Default)]
pub struct ConflictWatcher;

impl ConflictWatcher {
    pub fn new() -> Self {
        Self
    }

    /// Inspect a succeeded item's change description against the items
    /// scheduled in not-yet-started stages.
    pub fn inspect(
        &self,
        source: &WorkItemId,
        change_description: &str,
        upcoming: &[WorkItemId],
    ) -> Option<ConflictAlert> {
        if change_description.trim().is_empty() || upcoming.is_empty() {
            return None;
        }

        let lowered = change_description.to_lowercase();
        let matched: Vec<&str> = CATEGORIES
            .iter()
            .filter(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(kw)))
            .map(|(category, _)| *category)
            .collect();

        if matched.is_empty() {
            debug!("No conflict categories matched for {}", source);
            return None;
        }

        let affected: Vec<WorkItemId> = upcoming
            .iter()
            .filter(|candidate| *candidate != source)
            .filter(|candidate| candidate.shares_prefix(source, PREFIX_DEPTH))
            .cloned()
            .collect();

        if affected.is_empty() {
            debug!("Conflict categories {:?} matched for {} but no candidates", matched, source);
            return None;
        }

        Some(ConflictAlert {
            source_item_id: source.clone(),
            affected_item_ids: affected,
            reason: format!("{} touched {} concerns", source, matched.join(", ")),
            timestamp: Utc::now(),
        })
    }
}
