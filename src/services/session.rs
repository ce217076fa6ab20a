//! Session Context
//!
//! Read-only per-turn state passed explicitly into the retrieval and
//! execution services. Nothing in here is ambient or shared across turns.

use serde::{Deserialize, Serialize};

/// Scope and flags for a single conversational turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionScope {
    /// Project the turn operates in; all store queries are scoped to it.
    pub project_id: String,
    /// Free-chat mode disables the numeric sub-computation path.
    #[serde(default)]
    pub free_chat_mode: bool,
    /// Whether the numeric sub-computation is enabled at all.
    #[serde(default = "default_true")]
    pub calc_enabled: bool,
    /// Approximate token budget for the cumulative context.
    #[serde(default = "default_token_budget")]
    pub context_token_budget: usize,
}

fn default_true() -> bool {
    true
}

fn default_token_budget() -> usize {
    6000
}

impl SessionScope {
    /// Create a scope for a project with default flags.
    pub fn for_project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            free_chat_mode: false,
            calc_enabled: true,
            context_token_budget: default_token_budget(),
        }
    }
}

/// Project-level material fed into the planning prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectContext {
    /// Writing rules the user configured for the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<String>,
    /// Digest of the project's knowledge index (entity names, chapter list).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_summary: Option<String>,
}
