//! Relevance Scorer
//!
//! Pure scoring functions for ranking knowledge-store candidates.
//!
//! Baseline formula:
//!
//!   final_score = 0.70 * vector_sim
//!               + 0.10 * recency_bonus
//!               + 0.20 * importance
//!
//! When the caller supplies inferred categories, the similarity weight is
//! reduced to make room for a category-match signal:
//!
//!   final_score = 0.55 * vector_sim
//!               + 0.10 * recency_bonus
//!               + 0.20 * importance
//!               + 0.15 * category_bonus
//!
//! recency_bonus is 1.0 iff the record was surfaced within the last 24
//! hours. All signals are clamped to [0, 1] before combination. Ranking is
//! a stable descending sort, so ties keep their prior relative order and
//! identical inputs always produce identical output.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::services::store::KnowledgeRecord;

/// Neutral similarity assigned to hits that arrive without a vector score.
pub const NEUTRAL_SIMILARITY: f32 = 0.5;

/// Category tag for records without a bracketed name label.
pub const DEFAULT_CATEGORY: &str = "OTHER";

/// A knowledge record under consideration, with its derived score signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub record: KnowledgeRecord,
    pub vector_sim: f32,
    pub recency_bonus: f32,
    pub importance: f32,
    pub category_bonus: f32,
    pub final_score: f32,
}

fn clamp01(value: f32) -> f32 {
    value.clamp(0.0, 1.0)
}

/// Derive the category tag from a leading bracketed label on the record
/// name: `"[CHARACTER] Alice"` yields `CHARACTER`, anything else `OTHER`.
pub fn category_tag(name: &str) -> String {
    let trimmed = name.trim_start();
    if let Some(rest) = trimmed.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let tag = rest[..end].trim();
            if !tag.is_empty() {
                return tag.to_uppercase();
            }
        }
    }
    DEFAULT_CATEGORY.to_string()
}

/// 1.0 iff the record was last surfaced within 24 hours of `now`.
pub fn recency_bonus(last_used_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f32 {
    match last_used_at {
        Some(ts) if now.signed_duration_since(ts) <= Duration::hours(24) => 1.0,
        _ => 0.0,
    }
}

/// Baseline three-signal score.
pub fn baseline_score(vector_sim: f32, recency: f32, importance: f32) -> f32 {
    0.70 * clamp01(vector_sim) + 0.10 * clamp01(recency) + 0.20 * clamp01(importance)
}

/// Category-aware four-signal score.
pub fn category_score(
    vector_sim: f32,
    recency: f32,
    importance: f32,
    category_bonus: f32,
) -> f32 {
    0.55 * clamp01(vector_sim)
        + 0.10 * clamp01(recency)
        + 0.20 * clamp01(importance)
        + 0.15 * clamp01(category_bonus)
}

/// Score and rank raw hits. `vector_sim = None` falls back to the neutral
/// similarity. The category-aware formula engages only when
/// `inferred_categories` is non-empty.
pub fn score_candidates(
    hits: Vec<(KnowledgeRecord, Option<f32>)>,
    inferred_categories: Option<&[String]>,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let categories: Option<Vec<String>> = inferred_categories
        .filter(|c| !c.is_empty())
        .map(|c| c.iter().map(|s| s.to_uppercase()).collect());

    let mut candidates: Vec<Candidate> = hits
        .into_iter()
        .map(|(record, sim)| {
            let vector_sim = clamp01(sim.unwrap_or(NEUTRAL_SIMILARITY));
            let recency = recency_bonus(record.last_used_at, now);
            let importance = clamp01(record.importance);

            let (category_bonus, final_score) = match &categories {
                Some(inferred) => {
                    let bonus = if inferred.contains(&category_tag(&record.name)) {
                        1.0
                    } else {
                        0.0
                    };
                    (
                        bonus,
                        category_score(vector_sim, recency, importance, bonus),
                    )
                }
                None => (0.0, baseline_score(vector_sim, recency, importance)),
            };

            Candidate {
                record,
                vector_sim,
                recency_bonus: recency,
                importance,
                category_bonus,
                final_score,
            }
        })
        .collect();

    // sort_by is stable: equal scores keep their incoming relative order.
    candidates.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates
}
