//! External Execution Seams
//!
//! Traits for the collaborators the executor blocks on: the context
//! builder that assembles evidence for a step, and the bounded code
//! execution backend used by the numeric sub-computation.

use async_trait::async_trait;

use crate::services::planner::Step;
use crate::services::session::SessionScope;
use crate::utils::error::AppResult;

/// Context assembled for one step.
#[derive(Debug, Clone, Default)]
pub struct BuiltContext {
    /// Evidence text, sectioned with the marker labels.
    pub context: String,
    /// Identifiers of the sources that contributed.
    pub sources: Vec<String>,
}

/// Assembles evidence for a step from the knowledge store, chapter text,
/// timeline, and the other project surfaces.
#[async_trait]
pub trait ContextBuilder: Send + Sync {
    async fn build_context(
        &self,
        step: &Step,
        scope: &SessionScope,
        token_budget: usize,
    ) -> AppResult<BuiltContext>;
}

/// Result of a bounded code execution.
#[derive(Debug, Clone, Default)]
pub struct CodeOutcome {
    /// The value of the result variable, when execution succeeded.
    pub value: Option<String>,
    /// The execution error, when it did not.
    pub error: Option<String>,
}

/// Bounded execution backend for generated numeric code.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(&self, code: &str, result_variable: &str) -> AppResult<CodeOutcome>;
}
