// ABOUTME: Work item identifier type and extraction from free text
// ABOUTME: Scans descriptions for dotted numeric identifiers like PRD-1.1.2.1

use indexmap::IndexSet;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::error::{ParserError, Result};

/// Minimum and maximum number of dotted segments in a valid identifier.
pub const MIN_SEGMENTS: usize = 4;
pub const MAX_SEGMENTS: usize = 6;

/// A dotted, ordered identifier naming one unit of work (e.g. `1.1.2.1`).
///
/// Immutable once parsed. Ordering follows segment values, so `1.1.2.10`
/// sorts after `1.1.2.9`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkItemId {
    segments: Vec<u32>,
}

impl WorkItemId {
    pub fn segments(&self) -> &[u32] {
        &self.segments
    }

    /// Leading segments shared with another id, used by the conflict
    /// watcher to group items into the same feature area.
    pub fn shares_prefix(&self, other: &WorkItemId, depth: usize) -> bool {
        self.segments.len() >= depth
            && other.segments.len() >= depth
            && self.segments[..depth] == other.segments[..depth]
    }
}

impl FromStr for WorkItemId {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self> {
        let segments: Vec<u32> = s
            .split('.')
            .map(|part| {
                part.parse::<u32>()
                    .map_err(|_| ParserError::InvalidItemId(s.to_string()))
            })
            .collect::<Result<_>>()?;

        if !(MIN_SEGMENTS..=MAX_SEGMENTS).contains(&segments.len()) {
            return Err(ParserError::InvalidItemId(s.to_string()));
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.segments.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl TryFrom<String> for WorkItemId {
    type Error = ParserError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<WorkItemId> for String {
    fn from(id: WorkItemId) -> Self {
        id.to_string()
    }
}

/// Candidate tokens: runs of word characters, dots, and hyphens. Each token
/// is validated separately, so a 7-segment run is rejected whole instead of
/// yielding a bogus shorter id.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9][A-Za-z0-9.-]*").expect("token pattern is valid")
    })
}

/// Extract all work item identifiers from free text.
///
/// Accepts bare ids (`1.1.2.1`) and prefix-labeled ids (`PRD-1.1.2.1`).
/// First-occurrence order is preserved and repeated mentions collapse to a
/// single id. No match yields an empty list; the caller is responsible for
/// treating that as a validation error.
pub fn extract_ids(text: &str) -> Vec<WorkItemId> {
    let mut seen: IndexSet<WorkItemId> = IndexSet::new();

    for token in token_pattern().find_iter(text) {
        // Strip an optional `LABEL-` prefix and sentence punctuation.
        let candidate = match token.as_str().rsplit_once('-') {
            Some((_, rest)) => rest,
            None => token.as_str(),
        };
        let candidate = candidate.trim_matches('.');

        if let Ok(id) = candidate.parse::<WorkItemId>() {
            seen.insert(id);
        }
    }

    seen.into_iter().collect()
}
