//! Context Markers
//!
//! The marker contract between the context builder, the executor, the
//! outcome evaluator, and the verifier. The context builder labels each
//! evidence section with its kind; the executor writes step headers and the
//! computed-result anchor. Everything downstream keys off these constants.

use crate::services::planner::Intent;

/// Section labels that count as retrieved evidence.
pub const EVIDENCE_MARKERS: [&str; 3] = ["[KNOWLEDGE]", "[FRAGMENT]", "[CHAPTER]"];

/// Label on structured-query output.
pub const STRUCTURED_MARKER: &str = "[STRUCTURED]";

/// Label on timeline output.
pub const TIMELINE_MARKER: &str = "[TIMELINE]";

/// Anchor line written by the numeric sub-computation; the verifier's
/// numeric check engages only when this marker is present.
pub const COMPUTED_RESULT_MARKER: &str = "computed result:";

/// Header prefixed to each step's contribution to the cumulative context.
pub fn step_header(step_id: u32, intent: Intent) -> String {
    format!("[STEP {}: {}]", step_id, intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_header_format() {
        assert_eq!(
            step_header(2, Intent::KnowledgeSearch),
            "[STEP 2: knowledge-search]"
        );
    }
}
