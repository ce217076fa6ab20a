//! Plan Normalization
//!
//! Turns the planning LLM's raw JSON into a validated `Plan`. The contract
//! is total: unknown intents go through the synonym table or coerce to
//! casual-chat, malformed steps become no-op steps instead of disappearing
//! (step numbering stays stable), and the verification flag is recomputed
//! rather than trusted.

use serde_json::Value;

use super::types::{
    ChapterRangeMode, Intent, MutationOp, MutationTarget, Plan, Step, StepArgs,
};

/// Legacy intent synonyms: raw tag -> (mutation op, mutation target).
/// All of them map onto `data-mutation` with the listed descriptor.
const MUTATION_SYNONYMS: &[(&str, MutationOp, MutationTarget)] = &[
    ("extract-characters", MutationOp::Extract, MutationTarget::KnowledgeEntity),
    ("character-extraction", MutationOp::Extract, MutationTarget::KnowledgeEntity),
    ("extract-knowledge", MutationOp::Extract, MutationTarget::KnowledgeEntity),
    ("knowledge-extraction", MutationOp::Extract, MutationTarget::KnowledgeEntity),
    ("extract-relations", MutationOp::Extract, MutationTarget::Relation),
    ("relation-extraction", MutationOp::Extract, MutationTarget::Relation),
    ("extract-timeline", MutationOp::Extract, MutationTarget::Timeline),
    ("timeline-extraction", MutationOp::Extract, MutationTarget::Timeline),
    ("segment-chapters", MutationOp::Extract, MutationTarget::Segmentation),
    ("chapter-segmentation", MutationOp::Extract, MutationTarget::Segmentation),
    ("remember", MutationOp::Remember, MutationTarget::KnowledgeEntity),
    ("memorize", MutationOp::Remember, MutationTarget::KnowledgeEntity),
];

/// Normalize a raw planning response into a Plan.
///
/// Returns `None` only when no steps can be recovered at all; the caller
/// then falls through to the single-intent router.
pub fn normalize_plan(value: &Value) -> Option<Plan> {
    let raw_steps = value.get("steps")?.as_array()?;
    let steps = normalize_steps(raw_steps, 1);
    if steps.is_empty() {
        return None;
    }

    let analysis = value
        .get("analysis")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let requested = value
        .get("verification_required")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    Some(Plan::new(analysis, steps, requested))
}

/// Normalize a list of raw steps, renumbering sequentially from `start_id`.
pub fn normalize_steps(values: &[Value], start_id: u32) -> Vec<Step> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| normalize_step(v, start_id + i as u32))
        .collect()
}

/// Normalize a single raw step. Total: any malformed input degrades to a
/// casual-chat no-op step with the given id.
pub fn normalize_step(value: &Value, step_id: u32) -> Step {
    let mut args = value.get("args").map(parse_args).unwrap_or_default();

    let raw_intent = value
        .get("intent")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    let intent = coerce_intent(raw_intent, &mut args);

    args.normalize_range();

    let dependency = value
        .get("dependency")
        .and_then(|v| v.as_u64())
        .filter(|&d| d >= 1)
        .map(|d| d as u32);

    Step {
        step_id,
        intent,
        args,
        dependency,
    }
}

/// Map a raw intent tag onto the closed enum. Unknown tags first go through
/// the mutation synonym table (filling in the inferred descriptor when the
/// args lack one), then coerce to casual-chat.
pub fn coerce_intent(raw: &str, args: &mut StepArgs) -> Intent {
    let tag = raw.trim().to_lowercase();
    if let Some(intent) = Intent::parse(&tag) {
        return intent;
    }

    for (synonym, op, target) in MUTATION_SYNONYMS {
        if tag == *synonym {
            if args.mutation_op.is_none() {
                args.mutation_op = Some(*op);
            }
            if args.mutation_target.is_none() {
                args.mutation_target = Some(*target);
            }
            return Intent::DataMutation;
        }
    }

    Intent::CasualChat
}

fn parse_args(value: &Value) -> StepArgs {
    StepArgs {
        query: opt_string(value, "query"),
        documents: string_list(value, "documents"),
        entities: string_list(value, "entities"),
        chapter_start: opt_u32(value, "chapter_start"),
        chapter_end: opt_u32(value, "chapter_end"),
        range_mode: value
            .get("range_mode")
            .and_then(|v| v.as_str())
            .and_then(ChapterRangeMode::parse)
            .unwrap_or_default(),
        categories: string_list(value, "categories"),
        mutation_op: value
            .get("mutation_op")
            .and_then(|v| v.as_str())
            .and_then(MutationOp::parse),
        mutation_target: value
            .get("mutation_target")
            .and_then(|v| v.as_str())
            .and_then(MutationTarget::parse),
        structured_target: opt_string(value, "structured_target"),
        clarification: opt_string(value, "clarification"),
        update_summary: opt_string(value, "update_summary"),
    }
}

fn opt_string(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn opt_u32(value: &Value, key: &str) -> Option<u32> {
    value.get(key).and_then(|v| v.as_u64()).map(|n| n as u32)
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
