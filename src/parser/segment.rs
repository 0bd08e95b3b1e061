// ABOUTME: Lexical segment classification for workflow descriptions
// ABOUTME: Splits text on sequential cues and classifies each segment parallel or sequential

use regex::Regex;
use std::sync::OnceLock;

use super::extract::{extract_ids, WorkItemId};

/// One ordered slice of the description, carrying the work items mentioned
/// in it and the execution mode the wording implies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub items: Vec<WorkItemId>,
    pub parallel: bool,
}

/// Cue phrases that delimit sequential segments.
const SEQUENTIAL_DELIMITERS: &str = r"\bthen\b|\bafter\b|\bfollowed by\b|\bnext\b";

/// Cue phrases that mark a segment as parallel.
const PARALLEL_CUES: [&str; 5] = [
    "together",
    "in parallel",
    "concurrently",
    "simultaneously",
    "at the same time",
];

/// Cue phrases that keep a multi-item segment sequential.
const SEQUENTIAL_CUES: [&str; 4] = ["one at a time", "sequentially", "in sequence", "in order"];

fn delimiter_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!("(?i){SEQUENTIAL_DELIMITERS}")).expect("delimiter pattern is valid")
    })
}

/// Splits free text into ordered, classified segments.
///
/// The heuristic is purely lexical and lives behind this one type so it can
/// be tested and swapped independently of graph and execution logic.
#[derive(Debug, Clone, Default)]
pub struct SegmentClassifier;

impl SegmentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a description into ordered segments.
    ///
    /// Segments without work items are discarded. An id claimed by an
    /// earlier segment is dropped from later ones, matching the global
    /// first-occurrence dedup of extraction.
    pub fn classify(&self, text: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut claimed: Vec<WorkItemId> = Vec::new();

        for chunk in delimiter_pattern().split(text) {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                continue;
            }

            let items: Vec<WorkItemId> = extract_ids(chunk)
                .into_iter()
                .filter(|id| !claimed.contains(id))
                .collect();
            if items.is_empty() {
                continue;
            }
            claimed.extend(items.iter().cloned());

            let parallel = Self::is_parallel(chunk, items.len());

            segments.push(Segment {
                text: chunk.to_string(),
                items,
                parallel,
            });
        }

        segments
    }

    /// A segment is parallel if it carries an explicit parallel cue, or if
    /// it lists several ids (comma/`and`-joined) without an explicit
    /// sequential cue.
    fn is_parallel(chunk: &str, item_count: usize) -> bool {
        let lowered = chunk.to_lowercase();

        if PARALLEL_CUES.iter().any(|cue| lowered.contains(cue)) {
            return true;
        }
        if SEQUENTIAL_CUES.iter().any(|cue| lowered.contains(cue)) {
            return false;
        }

        item_count > 1 && (lowered.contains(',') || lowered.contains(" and "))
    }
}
