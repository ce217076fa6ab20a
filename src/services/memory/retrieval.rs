//! Hybrid Retrieval
//!
//! Vector-first search over the knowledge store with a keyword fallback:
//!
//! 1. Embed the query. With an embedding, issue the store's combined
//!    vector+keyword similarity query, over-fetching `max(top_k * 3, 30)`
//!    candidates for the reranking stage.
//! 2. Without an embedding (or on an empty result or a failed query), fall
//!    back to keyword matching over record name and description; fallback
//!    hits carry the neutral similarity of 0.5.
//! 3. Drop archived records, rank through the scorer, truncate to `top_k`.
//!
//! Retrieval is best-effort: every internal failure is logged and degraded
//! to "no candidates". `search` never returns an error.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use storyweave_llm::EmbeddingProvider;

use crate::services::session::SessionScope;
use crate::services::store::{KnowledgeRecord, KnowledgeStore, SimilaritySearchRequest};
use crate::utils::error::AppResult;

use super::scorer::{score_candidates, Candidate};

/// Minimum candidate pool requested from the store before reranking.
const MIN_CANDIDATE_POOL: usize = 30;

/// Retrieval tuning knobs.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Similarity floor for the store's vector query.
    pub match_threshold: f32,
    /// Default result count when the caller does not specify one.
    pub default_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.3,
            default_top_k: 8,
        }
    }
}

/// Hybrid retriever over the knowledge store.
pub struct Retriever {
    store: Arc<dyn KnowledgeStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(store: Arc<dyn KnowledgeStore>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_config(store, embedder, RetrievalConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn KnowledgeStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    /// Search the scope's knowledge for `query`, returning at most `top_k`
    /// ranked candidates. Category-aware scoring engages when `categories`
    /// is non-empty.
    pub async fn search(
        &self,
        query: &str,
        scope: &SessionScope,
        top_k: usize,
        categories: &[String],
    ) -> Vec<Candidate> {
        let hits = match self.gather(query, scope, top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!("knowledge retrieval failed, returning no candidates: {e}");
                return Vec::new();
            }
        };

        let inferred = if categories.is_empty() {
            None
        } else {
            Some(categories)
        };
        let mut ranked = score_candidates(hits, inferred, Utc::now());
        ranked.truncate(top_k);
        ranked
    }

    /// Bump usage bookkeeping for candidates that were actually consumed.
    /// Best-effort: failures are logged and ignored.
    pub async fn mark_used(&self, candidates: &[Candidate]) {
        for candidate in candidates {
            if let Err(e) = self.store.record_usage(&candidate.record.id).await {
                debug!("usage bump failed for {}: {e}", candidate.record.id);
            }
        }
    }

    async fn gather(
        &self,
        query: &str,
        scope: &SessionScope,
        top_k: usize,
    ) -> AppResult<Vec<(KnowledgeRecord, Option<f32>)>> {
        let embedding = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("query embedding failed, using keyword fallback: {e}");
                None
            }
        };

        let mut hits: Vec<(KnowledgeRecord, Option<f32>)> = Vec::new();

        if let Some(vector) = embedding {
            let request = SimilaritySearchRequest {
                query_text: query.to_string(),
                query_embedding: vector,
                match_threshold: self.config.match_threshold,
                match_count: (top_k * 3).max(MIN_CANDIDATE_POOL),
                project_id: scope.project_id.clone(),
            };
            match self.store.similarity_search(&request).await {
                Ok(found) => {
                    hits = found
                        .into_iter()
                        .map(|h| (h.record, Some(h.similarity)))
                        .collect();
                }
                Err(e) => {
                    warn!("similarity search failed, using keyword fallback: {e}");
                }
            }
        }

        if hits.is_empty() {
            hits = self.keyword_fallback(query, scope).await?;
        }

        let archived = self.store.archived_ids(&scope.project_id).await?;
        hits.retain(|(record, _)| !archived.contains(&record.id));
        Ok(hits)
    }

    /// Keyword fallback: a substring pattern query first, then word-overlap
    /// matching over the scope's records. Fallback hits carry no vector
    /// similarity; the scorer fills in the neutral default.
    async fn keyword_fallback(
        &self,
        query: &str,
        scope: &SessionScope,
    ) -> AppResult<Vec<(KnowledgeRecord, Option<f32>)>> {
        let direct = self
            .store
            .pattern_search(&scope.project_id, query)
            .await?;
        if !direct.is_empty() {
            return Ok(direct.into_iter().map(|r| (r, None)).collect());
        }

        let query_words = word_set(query);
        if query_words.is_empty() {
            return Ok(Vec::new());
        }

        let all = self.store.list(&scope.project_id).await?;
        Ok(all
            .into_iter()
            .filter(|r| {
                let mut record_words = word_set(&r.name);
                record_words.extend(word_set(&r.description));
                !record_words.is_disjoint(&query_words)
            })
            .map(|r| (r, None))
            .collect())
    }
}

fn word_set(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_string())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
