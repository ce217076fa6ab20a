//! Outcome Evaluator
//!
//! Decides, per intent, whether an executed step likely failed to find
//! usable data. Pure and side-effect-free: the only contract is the
//! boolean plus a human-readable reason. A positive result is what arms
//! the re-planner.

use crate::services::planner::Intent;

use super::markers::{EVIDENCE_MARKERS, STRUCTURED_MARKER};

/// Context shorter than this, with no evidence markers, counts as a miss
/// for the knowledge-search-like intents.
const MIN_EVIDENCE_CONTEXT_CHARS: usize = 200;

/// Classify one step's outcome. Returns `(should_replan, reason)`.
pub fn evaluate(intent: Intent, context: &str, sources: &[String]) -> (bool, String) {
    match intent {
        // These either need no evidence or are handled elsewhere entirely.
        Intent::Clarify | Intent::DataMutation | Intent::WebLookup => (false, String::new()),

        Intent::KnowledgeSearch | Intent::FragmentSearch | Intent::MixedContext => {
            let has_evidence = EVIDENCE_MARKERS
                .iter()
                .any(|m| contains_marker(context, sources, m));
            if !has_evidence && context.chars().count() < MIN_EVIDENCE_CONTEXT_CHARS {
                (
                    true,
                    format!("{} step found no usable evidence", intent),
                )
            } else {
                (false, String::new())
            }
        }

        Intent::StructuredQuery => {
            if contains_marker(context, sources, STRUCTURED_MARKER) {
                (false, String::new())
            } else {
                (
                    true,
                    "structured query produced no tagged results".to_string(),
                )
            }
        }

        _ => (false, String::new()),
    }
}

fn contains_marker(context: &str, sources: &[String], marker: &str) -> bool {
    context.contains(marker) || sources.iter().any(|s| s.contains(marker))
}
