//! Turn Planner
//!
//! `TurnPlanner::plan` turns free text into a validated `Plan`. The
//! function is total: a failed or malformed planning call degrades to the
//! single-intent router, and a failed router degrades to a one-step
//! casual-chat plan carrying the original text. The system never fails to
//! produce a plan.

use std::sync::Arc;

use tracing::warn;

use storyweave_core::json::parse_json_object;
use storyweave_llm::{LlmProvider, LlmRequestOptions, Message};

use crate::services::session::ProjectContext;

use super::heuristics::planning_hint;
use super::normalize::{coerce_intent, normalize_plan};
use super::prompts::{planning_system_prompt, planning_user_message, router_system_prompt};
use super::types::{Intent, Plan, StepArgs};

/// How many trailing history turns are shown to the planning call.
const MAX_HISTORY_TURNS: usize = 6;

/// LLM-backed planner for one conversational turn.
pub struct TurnPlanner {
    provider: Arc<dyn LlmProvider>,
}

impl TurnPlanner {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Produce a plan for the user's request. Never fails.
    pub async fn plan(
        &self,
        user_text: &str,
        recent_history: &[Message],
        project: &ProjectContext,
    ) -> Plan {
        if let Some(plan) = self.plan_multi_step(user_text, recent_history, project).await {
            return plan;
        }
        warn!("planning call failed or was malformed, degrading to single-intent router");

        if let Some(plan) = self.route_single_intent(user_text).await {
            return plan;
        }
        warn!("single-intent router failed, using the casual-chat default plan");

        fallback_plan(user_text)
    }

    async fn plan_multi_step(
        &self,
        user_text: &str,
        recent_history: &[Message],
        project: &ProjectContext,
    ) -> Option<Plan> {
        let history_window = trailing_window(recent_history, MAX_HISTORY_TURNS);
        let hint = planning_hint(user_text);
        let user_message =
            planning_user_message(user_text, history_window, project, &hint);

        let options = LlmRequestOptions {
            temperature_override: Some(0.2),
            json_mode: true,
            ..Default::default()
        };

        let response = self
            .provider
            .complete(
                vec![Message::user(user_message)],
                Some(planning_system_prompt()),
                options,
            )
            .await
            .ok()?;

        let value = parse_json_object(response.text())?;
        normalize_plan(&value)
    }

    async fn route_single_intent(&self, user_text: &str) -> Option<Plan> {
        let options = LlmRequestOptions {
            temperature_override: Some(0.0),
            json_mode: true,
            ..Default::default()
        };

        let response = self
            .provider
            .complete(
                vec![Message::user(user_text.to_string())],
                Some(router_system_prompt()),
                options,
            )
            .await
            .ok()?;

        let value = parse_json_object(response.text())?;
        let raw_intent = value.get("intent")?.as_str()?;

        let mut args = StepArgs {
            query: Some(user_text.to_string()),
            ..Default::default()
        };
        if let Some(query) = value
            .get("args")
            .and_then(|a| a.get("query"))
            .and_then(|q| q.as_str())
            .filter(|q| !q.trim().is_empty())
        {
            args.query = Some(query.to_string());
        }
        let intent = coerce_intent(raw_intent, &mut args);

        Some(Plan::single("", intent, args))
    }
}

/// The hard default: one casual-chat step with the original request as the
/// refined query.
pub fn fallback_plan(user_text: &str) -> Plan {
    Plan::single(
        "",
        Intent::CasualChat,
        StepArgs {
            query: Some(user_text.to_string()),
            ..Default::default()
        },
    )
}

fn trailing_window(history: &[Message], max: usize) -> &[Message] {
    if history.len() > max {
        &history[history.len() - max..]
    } else {
        history
    }
}
