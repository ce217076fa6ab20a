//! Shared Test Collaborators
//!
//! Scripted implementations of the external seams, used by the end-to-end
//! turn tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use storyweave::services::executor::{BuiltContext, CodeExecutor, CodeOutcome, ContextBuilder};
use storyweave::services::memory::Retriever;
use storyweave::services::verifier::ResponseGenerator;
use storyweave::{AppResult, SessionScope, Step};
use storyweave_llm::{
    EmbeddingProvider, LlmError, LlmProvider, LlmRequestOptions, LlmResponse, LlmResult, Message,
};

/// LLM provider returning scripted responses in call order.
pub struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(
        &self,
        _messages: Vec<Message>,
        _system: Option<String>,
        _options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Err(LlmError::Other {
                message: "script exhausted".to_string(),
            })
        } else {
            Ok(LlmResponse::from_text("scripted-model", responses.remove(0)))
        }
    }

    async fn health_check(&self) -> LlmResult<()> {
        Ok(())
    }
}

/// Embedder that never produces a vector, forcing the keyword fallback.
pub struct NoEmbedder;

#[async_trait]
impl EmbeddingProvider for NoEmbedder {
    async fn embed(&self, _text: &str) -> LlmResult<Option<Vec<f32>>> {
        Ok(None)
    }
}

/// Context builder backed by the real retriever: knowledge candidates are
/// rendered as `[KNOWLEDGE]` sections and their usage is bumped, the way
/// the host application's context assembly does it.
pub struct RetrievalContextBuilder {
    retriever: Retriever,
}

impl RetrievalContextBuilder {
    pub fn new(retriever: Retriever) -> Self {
        Self { retriever }
    }
}

#[async_trait]
impl ContextBuilder for RetrievalContextBuilder {
    async fn build_context(
        &self,
        step: &Step,
        scope: &SessionScope,
        _token_budget: usize,
    ) -> AppResult<BuiltContext> {
        let query = step.args.query.clone().unwrap_or_default();
        let candidates = self
            .retriever
            .search(&query, scope, 5, &step.args.categories)
            .await;
        if candidates.is_empty() {
            return Ok(BuiltContext::default());
        }

        let mut sections = Vec::new();
        let mut sources = Vec::new();
        for candidate in &candidates {
            sections.push(format!(
                "[KNOWLEDGE] {}: {}",
                candidate.record.name, candidate.record.description
            ));
            sources.push(format!("[KNOWLEDGE] {}", candidate.record.id));
        }
        self.retriever.mark_used(&candidates).await;

        Ok(BuiltContext {
            context: sections.join("\n"),
            sources,
        })
    }
}

/// Code executor returning a fixed value.
pub struct FixedCodeExecutor {
    pub value: String,
}

#[async_trait]
impl CodeExecutor for FixedCodeExecutor {
    async fn execute(&self, _code: &str, _result_variable: &str) -> AppResult<CodeOutcome> {
        Ok(CodeOutcome {
            value: Some(self.value.clone()),
            error: None,
        })
    }
}

/// Response generator returning scripted corrections.
pub struct ScriptedGenerator {
    responses: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
        }
    }
}

#[async_trait]
impl ResponseGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(String::new())
        } else {
            Ok(responses.remove(0))
        }
    }
}
