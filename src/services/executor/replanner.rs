//! Re-planner
//!
//! When a step fails its outcome evaluation, one LLM call decides what to
//! do with the remaining plan: continue, replace it, or abort. Re-planning
//! is an optimization, never a point of failure: every malformed or failed
//! consult degrades to `continue`.

use std::sync::Arc;

use tracing::warn;

use storyweave_core::json::parse_json_object;
use storyweave_core::text::truncate_chars;
use storyweave_llm::{LlmProvider, LlmRequestOptions, Message};

use crate::services::planner::normalize::normalize_steps;
use crate::services::planner::Step;

use super::types::{ReplanAction, StepResult};

/// The re-planner's verdict for the remaining plan.
#[derive(Debug, Clone)]
pub struct ReplanDecision {
    pub action: ReplanAction,
    pub reason: String,
    pub new_steps: Vec<Step>,
}

impl ReplanDecision {
    /// The safe default: keep going with the original plan.
    pub fn continue_default() -> Self {
        Self {
            action: ReplanAction::Continue,
            reason: String::new(),
            new_steps: Vec::new(),
        }
    }
}

/// LLM-backed re-planning consult.
pub struct Replanner {
    provider: Arc<dyn LlmProvider>,
    /// Bound on the context excerpt shown to the model.
    context_limit: usize,
}

impl Replanner {
    pub fn new(provider: Arc<dyn LlmProvider>, context_limit: usize) -> Self {
        Self {
            provider,
            context_limit,
        }
    }

    /// Ask whether to continue, replace, or abort the remaining plan.
    /// Replacement steps are renumbered from `next_step_id`.
    #[allow(clippy::too_many_arguments)]
    pub async fn replan(
        &self,
        user_text: &str,
        cumulative_context: &str,
        step_history: &[StepResult],
        failed_step: &Step,
        failure_reason: &str,
        remaining_steps: &[Step],
        next_step_id: u32,
    ) -> ReplanDecision {
        let prompt = self.build_prompt(
            user_text,
            cumulative_context,
            step_history,
            failed_step,
            failure_reason,
            remaining_steps,
        );

        let options = LlmRequestOptions {
            temperature_override: Some(0.2),
            json_mode: true,
            ..Default::default()
        };

        let response = match self
            .provider
            .complete(vec![Message::user(prompt)], Some(REPLAN_SYSTEM.to_string()), options)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("re-planning consult failed, continuing with original plan: {e}");
                return ReplanDecision::continue_default();
            }
        };

        let Some(value) = parse_json_object(response.text()) else {
            warn!("re-planning response was not valid JSON, continuing");
            return ReplanDecision::continue_default();
        };

        let Some(action) = value
            .get("action")
            .and_then(|v| v.as_str())
            .and_then(ReplanAction::parse)
        else {
            warn!("re-planning response had no recognizable action, continuing");
            return ReplanDecision::continue_default();
        };

        let reason = value
            .get("reason")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let new_steps = value
            .get("steps")
            .and_then(|v| v.as_array())
            .map(|raw| normalize_steps(raw, next_step_id))
            .unwrap_or_default();

        // A replacement without steps is meaningless; downgrade silently.
        let action = if action == ReplanAction::Replace && new_steps.is_empty() {
            ReplanAction::Continue
        } else {
            action
        };
        let new_steps = if action == ReplanAction::Replace {
            new_steps
        } else {
            Vec::new()
        };

        ReplanDecision {
            action,
            reason,
            new_steps,
        }
    }

    fn build_prompt(
        &self,
        user_text: &str,
        cumulative_context: &str,
        step_history: &[StepResult],
        failed_step: &Step,
        failure_reason: &str,
        remaining_steps: &[Step],
    ) -> String {
        let history: Vec<String> = step_history
            .iter()
            .map(|r| format!("#{} {}", r.step_id, r.intent))
            .collect();
        let remaining: Vec<String> = remaining_steps
            .iter()
            .map(|s| {
                format!(
                    "#{} {} (query: {})",
                    s.step_id,
                    s.intent,
                    s.args.query.as_deref().unwrap_or("-")
                )
            })
            .collect();
        let failed_args =
            serde_json::to_string(&failed_step.args).unwrap_or_else(|_| "{}".to_string());

        format!(
            "## Original request\n{}\n\n\
             ## Executed steps\n{}\n\n\
             ## Failed step\n#{} {} args={}\nReason: {}\n\n\
             ## Context so far\n{}\n\n\
             ## Remaining steps\n{}",
            user_text,
            history.join("\n"),
            failed_step.step_id,
            failed_step.intent,
            failed_args,
            failure_reason,
            truncate_chars(cumulative_context, self.context_limit),
            remaining.join("\n"),
        )
    }
}

const REPLAN_SYSTEM: &str = r#"A step of a retrieval plan failed to find usable data.
Decide what to do with the remaining steps. Respond with a JSON object only:
{"action": "continue" | "replace" | "abort", "reason": "<why>", "steps": [...]}

- "continue": the remaining steps are still worth running as-is
- "replace": supply new steps (same shape as planning output) in "steps"
- "abort": nothing further can help; stop executing"#;
