//! Turn Executor
//!
//! Drives a plan through the context builder, step by step and strictly in
//! list order. Two hard caps guarantee termination regardless of LLM
//! behavior: `max_steps_per_turn` and `max_replan_rounds`. Data-mutation
//! steps are never executed inline; they are deferred as descriptors for
//! the background mutation runner.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, warn};

use storyweave_core::json::strip_code_fences;
use storyweave_core::text::{estimate_tokens, truncate_chars};
use storyweave_llm::{LlmProvider, LlmRequestOptions, Message};

use crate::services::planner::{Intent, MutationOp, Plan, Step};
use crate::services::session::SessionScope;

use super::context::{BuiltContext, CodeExecutor, ContextBuilder};
use super::evaluator::evaluate;
use super::markers::{step_header, COMPUTED_RESULT_MARKER};
use super::replanner::Replanner;
use super::types::{
    ExecutionOutcome, ExecutorConfig, PendingMutation, ReplanAction, ReplanEvent, StepResult,
};

/// Name of the variable generated calculation code must assign.
const RESULT_VARIABLE: &str = "result";

/// Per-turn plan executor.
pub struct TurnExecutor {
    context_builder: Arc<dyn ContextBuilder>,
    provider: Arc<dyn LlmProvider>,
    code_executor: Option<Arc<dyn CodeExecutor>>,
    replanner: Replanner,
    config: ExecutorConfig,
}

impl TurnExecutor {
    pub fn new(context_builder: Arc<dyn ContextBuilder>, provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(context_builder, provider, ExecutorConfig::default())
    }

    pub fn with_config(
        context_builder: Arc<dyn ContextBuilder>,
        provider: Arc<dyn LlmProvider>,
        config: ExecutorConfig,
    ) -> Self {
        let replanner = Replanner::new(provider.clone(), config.replan_context_chars);
        Self {
            context_builder,
            provider,
            code_executor: None,
            replanner,
            config,
        }
    }

    /// Attach the bounded code-execution backend for numeric-calc steps.
    pub fn with_code_executor(mut self, code_executor: Arc<dyn CodeExecutor>) -> Self {
        self.code_executor = Some(code_executor);
        self
    }

    /// Execute a plan for one turn.
    pub async fn execute(
        &self,
        plan: &Plan,
        user_text: &str,
        scope: &SessionScope,
    ) -> ExecutionOutcome {
        let mut queue: VecDeque<Step> = plan.steps.iter().cloned().collect();
        let mut context_parts: Vec<String> = Vec::new();
        let mut all_sources: Vec<String> = Vec::new();
        let mut step_results: Vec<StepResult> = Vec::new();
        let mut replan_events: Vec<ReplanEvent> = Vec::new();
        let mut pending_mutations: Vec<PendingMutation> = Vec::new();

        let mut steps_executed = 0usize;
        let mut replan_count = 0usize;

        while let Some(step) = queue.pop_front() {
            if steps_executed >= self.config.max_steps_per_turn {
                warn!(
                    "step budget of {} exhausted, dropping {} remaining steps",
                    self.config.max_steps_per_turn,
                    queue.len() + 1
                );
                break;
            }
            steps_executed += 1;

            // Deferred data mutations never build context or execute inline.
            if step.intent == Intent::DataMutation {
                if let Some(target) = step.args.mutation_target.filter(|t| t.defers_execution()) {
                    let operation = step.args.mutation_op.unwrap_or(MutationOp::Extract);
                    let note = format!(
                        "{} queued {} on {} for confirmation",
                        step_header(step.step_id, step.intent),
                        operation,
                        target
                    );
                    context_parts.push(note.clone());
                    pending_mutations.push(PendingMutation::from_args(
                        operation, target, &step.args,
                    ));
                    step_results.push(StepResult {
                        step_id: step.step_id,
                        intent: step.intent,
                        context_snippet: note,
                        executor_result: None,
                    });
                    continue;
                }
            }

            let built = match self
                .context_builder
                .build_context(&step, scope, scope.context_token_budget)
                .await
            {
                Ok(built) => built,
                Err(e) => {
                    warn!("context build failed for step {}: {e}", step.step_id);
                    BuiltContext::default()
                }
            };
            all_sources.extend(built.sources.iter().cloned());

            let header = step_header(step.step_id, step.intent);
            let mut executor_result: Option<String> = None;

            if step.intent.is_independent() {
                // One-off lookups only leave a marker note so they do not
                // pollute downstream steps; the full output stays in the
                // step result.
                context_parts.push(format!("{} completed (output recorded separately)", header));
            } else if step.intent == Intent::NumericCalc
                && scope.calc_enabled
                && !scope.free_chat_mode
            {
                if !built.context.is_empty() {
                    context_parts.push(format!("{}\n{}", header, built.context));
                }
                let computed = self.run_calculation(&step, &built.context).await;
                context_parts.push(format!("{} {}", COMPUTED_RESULT_MARKER, computed));
                executor_result = Some(computed);
            } else {
                context_parts.push(format!("{}\n{}", header, built.context));
            }

            step_results.push(StepResult {
                step_id: step.step_id,
                intent: step.intent,
                context_snippet: truncate_chars(&built.context, self.config.max_snippet_chars),
                executor_result,
            });

            let (should_replan, reason) = evaluate(step.intent, &built.context, &built.sources);
            if should_replan && !queue.is_empty() && replan_count < self.config.max_replan_rounds
            {
                let remaining: Vec<Step> = queue.iter().cloned().collect();
                let cumulative = context_parts.join("\n\n");
                let next_step_id = step_results.len() as u32 + 1;
                let decision = self
                    .replanner
                    .replan(
                        user_text,
                        &cumulative,
                        &step_results,
                        &step,
                        &reason,
                        &remaining,
                        next_step_id,
                    )
                    .await;

                replan_events.push(ReplanEvent {
                    step_id: step.step_id,
                    reason,
                    action: decision.action,
                    new_plan_summary: decision.new_steps.iter().map(|s| s.intent).collect(),
                });

                match decision.action {
                    ReplanAction::Abort => {
                        debug!("re-planner aborted the remaining plan at step {}", step.step_id);
                        queue.clear();
                        break;
                    }
                    ReplanAction::Replace => {
                        debug!(
                            "re-planner replaced {} remaining steps with {}",
                            remaining.len(),
                            decision.new_steps.len()
                        );
                        queue = decision.new_steps.into_iter().collect();
                        replan_count += 1;
                    }
                    ReplanAction::Continue => {}
                }
            }
        }

        let mut context = context_parts.join("\n\n");
        if estimate_tokens(&context) > scope.context_token_budget {
            context = truncate_chars(&context, scope.context_token_budget * 4);
        }

        ExecutionOutcome {
            context,
            sources: all_sources,
            step_results,
            replan_events,
            pending_mutations,
        }
    }

    /// Generate and run the bounded numeric sub-computation, returning the
    /// computed value or an error description.
    async fn run_calculation(&self, step: &Step, context: &str) -> String {
        let Some(code_executor) = &self.code_executor else {
            return "error: no code execution backend configured".to_string();
        };

        let question = step.args.query.as_deref().unwrap_or("");
        let prompt = format!(
            "Write a short Python snippet computing the answer to the question below.\n\
             Assign the final answer to a single variable named `{}`.\n\
             Output only the code.\n\n\
             Question: {}\n\nData:\n{}",
            RESULT_VARIABLE,
            question,
            truncate_chars(context, self.config.replan_context_chars),
        );

        let options = LlmRequestOptions {
            temperature_override: Some(0.0),
            ..Default::default()
        };
        let code = match self
            .provider
            .complete(vec![Message::user(prompt)], None, options)
            .await
        {
            Ok(response) => strip_code_fences(response.text()),
            Err(e) => return format!("error: code generation failed: {e}"),
        };

        match code_executor.execute(&code, RESULT_VARIABLE).await {
            Ok(outcome) => match outcome.value {
                Some(value) => value,
                None => format!(
                    "error: {}",
                    outcome.error.unwrap_or_else(|| "no result produced".to_string())
                ),
            },
            Err(e) => format!("error: {e}"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
