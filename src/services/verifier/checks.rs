//! Verification Checks
//!
//! Per-intent checks of a draft answer against the cumulative context:
//! numeric tolerance anchored on the computed-result marker, a minimum
//! length for timeline answers, and an LLM-judged grounding check.
//!
//! The grounding judge is fail-open by design: an unparseable judge reply
//! passes verification rather than blocking the user on judge-format
//! drift. Do not tighten this.

use std::sync::Arc;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use storyweave_core::text::truncate_chars;
use storyweave_llm::{LlmProvider, LlmRequestOptions, Message};

use crate::services::executor::markers::{COMPUTED_RESULT_MARKER, TIMELINE_MARKER};
use crate::services::planner::Intent;

/// Allowed relative deviation for numeric answers.
const NUMERIC_TOLERANCE: f64 = 0.01;

/// Minimum length of a timeline answer.
const MIN_TIMELINE_RESPONSE_CHARS: usize = 10;

/// Result of one verification pass; recomputed on every retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub valid: bool,
    pub error_message: String,
}

impl VerificationOutcome {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error_message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            error_message: message.into(),
        }
    }
}

/// Verifier tuning knobs.
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    /// Correction attempts before degrading with the warning suffix.
    pub max_retries: u32,
    /// Bound on the context excerpt shown to the judge and the corrector.
    pub judge_context_chars: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            judge_context_chars: 2500,
        }
    }
}

/// Intents that bypass verification entirely.
fn skips_verification(intent: Intent) -> bool {
    matches!(
        intent,
        Intent::Clarify | Intent::DataMutation | Intent::CasualChat
    )
}

/// Intents whose answers must be grounded in the assembled context.
fn needs_grounding(intent: Intent) -> bool {
    matches!(
        intent,
        Intent::KnowledgeSearch
            | Intent::FragmentSearch
            | Intent::MixedContext
            | Intent::ReadContent
            | Intent::StructuredQuery
    )
}

/// Extract all numeric tokens from a text: optional sign, decimals, with
/// comma-as-decimal normalized to a dot.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    static NUMBER: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(pattern) = NUMBER.get_or_init(|| Regex::new(r"[-+]?\d+(?:[.,]\d+)?").ok()) else {
        return Vec::new();
    };
    pattern
        .find_iter(text)
        .filter_map(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
        .collect()
}

/// Checks a draft answer against the cumulative context and drives the
/// LLM grounding judge.
pub struct Verifier {
    provider: Arc<dyn LlmProvider>,
    config: VerifierConfig,
}

impl Verifier {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self::with_config(provider, VerifierConfig::default())
    }

    pub fn with_config(provider: Arc<dyn LlmProvider>, config: VerifierConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Verify a draft answer. Checks engage per intent and per context
    /// marker; the first failure wins.
    pub async fn verify(
        &self,
        response: &str,
        context: &str,
        intents: &[Intent],
    ) -> VerificationOutcome {
        if !intents.is_empty() && intents.iter().all(|i| skips_verification(*i)) {
            return VerificationOutcome::ok();
        }

        if context.contains(COMPUTED_RESULT_MARKER) {
            if let Some(error) = check_numeric(response, context) {
                return VerificationOutcome::invalid(error);
            }
        }

        if context.contains(TIMELINE_MARKER) {
            if let Some(error) = check_timeline(response) {
                return VerificationOutcome::invalid(error);
            }
        }

        if intents.iter().any(|i| needs_grounding(*i)) {
            if let Some(error) = self.check_grounding(response, context).await {
                return VerificationOutcome::invalid(error);
            }
        }

        VerificationOutcome::ok()
    }

    /// One judge call asking whether the response is entirely supported by
    /// the context. Expects a reply prefixed `OK` or `VIOLATION: <excerpt>`;
    /// every other outcome passes (fail-open).
    async fn check_grounding(&self, response: &str, context: &str) -> Option<String> {
        let prompt = format!(
            "Context:\n{}\n\nAnswer:\n{}\n\n\
             Is every claim in the answer supported by the context?\n\
             Reply with exactly `OK` if so, or `VIOLATION: <the unsupported excerpt>` if not.",
            truncate_chars(context, self.config.judge_context_chars),
            response,
        );

        let options = LlmRequestOptions {
            temperature_override: Some(0.0),
            ..Default::default()
        };
        let reply = match self
            .provider
            .complete(vec![Message::user(prompt)], None, options)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!("grounding judge call failed, passing verification: {e}");
                return None;
            }
        };

        let text = reply.text().trim().to_string();
        if text.starts_with("OK") {
            None
        } else if let Some(rest) = text.strip_prefix("VIOLATION") {
            let excerpt = rest.trim_start_matches(':').trim();
            Some(format!("unsupported claim: {}", excerpt))
        } else {
            // Unrecognized judge format: pass rather than block the user.
            None
        }
    }
}

/// Compare every number in the response against the last numeric token of
/// the context; any relative deviation above the tolerance fails.
fn check_numeric(response: &str, context: &str) -> Option<String> {
    let reference = *extract_numbers(context).last()?;
    if reference == 0.0 {
        return None;
    }

    for value in extract_numbers(response) {
        let deviation = ((value - reference) / reference).abs();
        if deviation > NUMERIC_TOLERANCE {
            return Some(format!(
                "numeric mismatch: answer contains {} but the computed result is {}",
                value, reference
            ));
        }
    }
    None
}

fn check_timeline(response: &str) -> Option<String> {
    if response.chars().count() < MIN_TIMELINE_RESPONSE_CHARS {
        Some("timeline answer is too short to be usable".to_string())
    } else {
        None
    }
}
