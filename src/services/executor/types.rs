//! Executor Types
//!
//! Audit records and configuration for the per-turn execution loop.

use serde::{Deserialize, Serialize};

use crate::services::planner::{Intent, MutationOp, MutationTarget, StepArgs};

/// Outcome of one executed step; append-only once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: u32,
    pub intent: Intent,
    /// Bounded excerpt of the step's context, for audit and verification.
    pub context_snippet: String,
    /// Value produced by the numeric sub-computation, when one ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_result: Option<String>,
}

/// What the re-planner decided for the remaining plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplanAction {
    Continue,
    Replace,
    Abort,
}

impl ReplanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplanAction::Continue => "continue",
            ReplanAction::Replace => "replace",
            ReplanAction::Abort => "abort",
        }
    }

    pub fn parse(raw: &str) -> Option<ReplanAction> {
        match raw.trim() {
            "continue" => Some(ReplanAction::Continue),
            "replace" => Some(ReplanAction::Replace),
            "abort" => Some(ReplanAction::Abort),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReplanAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Audit record of one re-planning round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplanEvent {
    /// The step whose outcome triggered the round.
    pub step_id: u32,
    /// Why the step was judged to have failed.
    pub reason: String,
    pub action: ReplanAction,
    /// Intents of the replacement steps, when any.
    pub new_plan_summary: Vec<Intent>,
}

/// A confirmed-later data mutation handed to the background runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingMutation {
    pub operation: MutationOp,
    pub target: MutationTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_range: Option<(u32, u32)>,
}

impl PendingMutation {
    /// Resolve the chapter descriptor from step args: a two-chapter spread
    /// becomes a range, a single bound becomes a chapter number.
    pub fn from_args(operation: MutationOp, target: MutationTarget, args: &StepArgs) -> Self {
        let (chapter_number, chapter_range) = match (args.chapter_start, args.chapter_end) {
            (Some(start), Some(end)) if start != end => (None, Some((start, end))),
            (Some(start), Some(_)) => (Some(start), None),
            (Some(start), None) => (Some(start), None),
            (None, Some(end)) => (Some(end), None),
            (None, None) => (None, None),
        };
        Self {
            operation,
            target,
            chapter_number,
            chapter_range,
        }
    }
}

/// Everything one executor invocation produces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Cumulative context, bounded by the turn's token budget.
    pub context: String,
    /// All sources consumed across steps, in order.
    pub sources: Vec<String>,
    pub step_results: Vec<StepResult>,
    pub replan_events: Vec<ReplanEvent>,
    pub pending_mutations: Vec<PendingMutation>,
}

/// Iteration caps and size bounds for the execution loop. The two caps are
/// the sole forward-progress guarantees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Hard cap on executed steps per turn.
    pub max_steps_per_turn: usize,
    /// Hard cap on plan replacements per turn.
    pub max_replan_rounds: usize,
    /// Bound on the per-step context snippet kept for audit.
    pub max_snippet_chars: usize,
    /// Bound on the context shown to the re-planner.
    pub replan_context_chars: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_steps_per_turn: 10,
            max_replan_rounds: 2,
            max_snippet_chars: 2000,
            replan_context_chars: 2500,
        }
    }
}
