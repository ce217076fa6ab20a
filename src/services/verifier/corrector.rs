//! Correction Loop
//!
//! Bounded verify -> correct -> re-verify loop over a draft answer. After
//! the retries are exhausted, a still-invalid answer is released with a
//! warning suffix rather than dropped.

use async_trait::async_trait;
use tracing::{debug, warn};

use storyweave_core::text::truncate_chars;

use crate::services::planner::Intent;
use crate::utils::error::AppResult;

use super::checks::Verifier;

/// Fixed-format suffix appended when verification never succeeded.
pub const VERIFICATION_WARNING_PREFIX: &str =
    "\n\n---\nNote: this answer could not be fully verified against the project knowledge: ";

/// Regenerates an answer from a correction prompt. Implemented by the host
/// application's response generation path.
#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> AppResult<String>;
}

impl Verifier {
    /// Run the bounded correction loop over a draft answer.
    ///
    /// Returns the final response and the number of regeneration attempts
    /// used. With `required == false` the draft passes through untouched.
    pub async fn run_correction_loop(
        &self,
        draft: &str,
        context: &str,
        intents: &[Intent],
        generator: &dyn ResponseGenerator,
        required: bool,
    ) -> (String, u32) {
        if !required {
            return (draft.to_string(), 0);
        }

        let mut response = draft.to_string();
        let mut retries = 0u32;

        while retries < self.config().max_retries {
            let outcome = self.verify(&response, context, intents).await;
            if outcome.valid {
                return (response, retries);
            }
            debug!("verification failed, attempting correction: {}", outcome.error_message);

            let prompt = correction_prompt(
                &outcome.error_message,
                context,
                &response,
                self.config().judge_context_chars,
            );
            match generator.generate(&prompt).await {
                Ok(regenerated) if !regenerated.trim().is_empty() => {
                    response = regenerated;
                    retries += 1;
                }
                Ok(_) => {
                    warn!("correction produced an empty answer, keeping the previous one");
                    break;
                }
                Err(e) => {
                    warn!("correction call failed, keeping the previous answer: {e}");
                    break;
                }
            }
        }

        let outcome = self.verify(&response, context, intents).await;
        if !outcome.valid {
            response.push_str(VERIFICATION_WARNING_PREFIX);
            response.push_str(&outcome.error_message);
        }
        (response, retries)
    }
}

fn correction_prompt(
    error: &str,
    context: &str,
    previous_response: &str,
    context_limit: usize,
) -> String {
    format!(
        "Your previous answer failed verification.\n\n\
         ## Problem\n{}\n\n\
         ## Evidence\n{}\n\n\
         ## Previous answer\n{}\n\n\
         Rewrite the answer so that every claim is supported by the evidence \
         and any numbers match the computed result exactly.",
        error,
        truncate_chars(context, context_limit),
        previous_response,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use storyweave_llm::{LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message};

    /// Judge that fails verification a fixed number of times, then passes.
    struct CountingJudge {
        failures_left: Mutex<u32>,
    }

    impl CountingJudge {
        fn failing_times(n: u32) -> Arc<Self> {
            Arc::new(Self {
                failures_left: Mutex::new(n),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for CountingJudge {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        async fn complete(
            &self,
            _messages: Vec<Message>,
            _system: Option<String>,
            _options: LlmRequestOptions,
        ) -> LlmResult<LlmResponse> {
            let mut left = self.failures_left.lock().unwrap();
            let reply = if *left > 0 {
                *left -= 1;
                "VIOLATION: unsupported claim"
            } else {
                "OK"
            };
            Ok(LlmResponse::from_text("mock-model", reply))
        }

        async fn health_check(&self) -> LlmResult<()> {
            Ok(())
        }
    }

    struct ScriptedGenerator {
        responses: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn returning(responses: Vec<&str>) -> Self {
            Self {
                responses: Mutex::new(responses.into_iter().map(String::from).collect()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ResponseGenerator for ScriptedGenerator {
        async fn generate(&self, _prompt: &str) -> AppResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(String::new())
            } else {
                Ok(responses.remove(0))
            }
        }
    }

    const INTENTS: &[Intent] = &[Intent::KnowledgeSearch];

    #[tokio::test]
    async fn test_not_required_passes_through() {
        let verifier = Verifier::new(CountingJudge::failing_times(10));
        let generator = ScriptedGenerator::returning(vec![]);
        let (response, retries) = verifier
            .run_correction_loop("draft", "[KNOWLEDGE] ctx", INTENTS, &generator, false)
            .await;
        assert_eq!(response, "draft");
        assert_eq!(retries, 0);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_valid_draft_returns_immediately() {
        let verifier = Verifier::new(CountingJudge::failing_times(0));
        let generator = ScriptedGenerator::returning(vec![]);
        let (response, retries) = verifier
            .run_correction_loop("good draft", "[KNOWLEDGE] ctx", INTENTS, &generator, true)
            .await;
        assert_eq!(response, "good draft");
        assert_eq!(retries, 0);
    }

    #[tokio::test]
    async fn test_correction_then_success() {
        // First verify fails, the regenerated answer passes.
        let verifier = Verifier::new(CountingJudge::failing_times(1));
        let generator = ScriptedGenerator::returning(vec!["corrected answer"]);
        let (response, retries) = verifier
            .run_correction_loop("bad draft", "[KNOWLEDGE] ctx", INTENTS, &generator, true)
            .await;
        assert_eq!(response, "corrected answer");
        assert_eq!(retries, 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_appends_warning() {
        // Judge never passes: 2 corrections, then the final verification
        // still fails and the warning suffix is appended.
        let verifier = Verifier::new(CountingJudge::failing_times(10));
        let generator = ScriptedGenerator::returning(vec!["try one", "try two"]);
        let (response, retries) = verifier
            .run_correction_loop("bad draft", "[KNOWLEDGE] ctx", INTENTS, &generator, true)
            .await;
        assert_eq!(retries, 2);
        assert!(response.starts_with("try two"));
        assert!(response.contains(VERIFICATION_WARNING_PREFIX.trim_start()));
    }

    #[tokio::test]
    async fn test_empty_regeneration_keeps_previous_answer() {
        let verifier = Verifier::new(CountingJudge::failing_times(10));
        let generator = ScriptedGenerator::returning(vec!["   "]);
        let (response, retries) = verifier
            .run_correction_loop("bad draft", "[KNOWLEDGE] ctx", INTENTS, &generator, true)
            .await;
        assert!(response.starts_with("bad draft"));
        assert_eq!(retries, 0);
        assert!(response.contains("could not be fully verified"));
    }
}
