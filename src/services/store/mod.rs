//! Knowledge Store
//!
//! The orchestration core consumes the persistent knowledge store through
//! the `KnowledgeStore` trait: a combined vector+keyword similarity query,
//! a pattern fallback query, CRUD by id, the per-scope archived set, and
//! the usage bookkeeping bump. The relational schema behind it belongs to
//! the host application.

pub mod memory;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::AppResult;

pub use memory::{cosine_similarity, InMemoryKnowledgeStore};

/// A record in the project knowledge store.
///
/// Records carry an optional leading bracketed label on their name
/// (`"[CHARACTER] Alice"`); the scorer derives the category tag from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    /// Unique record identifier
    pub id: String,
    /// Owning project
    pub project_id: String,
    /// Display name, optionally prefixed with a bracketed category label
    pub name: String,
    /// Short description used by pattern search
    pub description: String,
    /// Full record body
    pub content: String,
    /// Manually-set importance bias (0.0 - 1.0)
    pub importance: f32,
    /// How many times retrieval surfaced this record
    pub lookup_count: i64,
    /// When retrieval last surfaced this record
    pub last_used_at: Option<DateTime<Utc>>,
    /// Precomputed embedding, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

/// Payload for inserting a new record; the store mints the id and zeroes
/// the usage counters.
#[derive(Debug, Clone)]
pub struct NewKnowledgeRecord {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub content: String,
    pub importance: f32,
    pub embedding: Option<Vec<f32>>,
}

/// Parameters for the combined vector+keyword similarity query.
#[derive(Debug, Clone)]
pub struct SimilaritySearchRequest {
    pub query_text: String,
    pub query_embedding: Vec<f32>,
    pub match_threshold: f32,
    pub match_count: usize,
    pub project_id: String,
}

/// A record returned by the similarity query, with its raw similarity.
#[derive(Debug, Clone)]
pub struct RecordHit {
    pub record: KnowledgeRecord,
    pub similarity: f32,
}

/// Generic query interface over the knowledge store.
///
/// Implementations must not panic on backend failures; they surface them as
/// `AppError::Store`, and the retrieval layer degrades them to empty results.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Combined vector+keyword similarity query, scoped to a project.
    async fn similarity_search(
        &self,
        request: &SimilaritySearchRequest,
    ) -> AppResult<Vec<RecordHit>>;

    /// Case-insensitive substring match over record name and description.
    async fn pattern_search(
        &self,
        project_id: &str,
        pattern: &str,
    ) -> AppResult<Vec<KnowledgeRecord>>;

    /// All records for a project (equality filter on project id).
    async fn list(&self, project_id: &str) -> AppResult<Vec<KnowledgeRecord>>;

    /// Ids of archived records for a project; retrieval drops these.
    async fn archived_ids(&self, project_id: &str) -> AppResult<HashSet<String>>;

    /// Fetch a record by id.
    async fn get(&self, id: &str) -> AppResult<Option<KnowledgeRecord>>;

    /// Insert a new record, returning it with its minted id.
    async fn insert(&self, record: NewKnowledgeRecord) -> AppResult<KnowledgeRecord>;

    /// Replace an existing record.
    async fn update(&self, record: KnowledgeRecord) -> AppResult<()>;

    /// Delete a record by id.
    async fn delete(&self, id: &str) -> AppResult<()>;

    /// Bump lookup_count and last_used_at for a surfaced record.
    async fn record_usage(&self, id: &str) -> AppResult<()>;
}
