//! In-Memory Knowledge Store
//!
//! A `KnowledgeStore` implementation backed by a HashMap. Used by tests and
//! by embedded deployments that do not need durable storage.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::utils::error::{AppError, AppResult};

use super::{
    KnowledgeRecord, KnowledgeStore, NewKnowledgeRecord, RecordHit, SimilaritySearchRequest,
};

/// Cosine similarity between two vectors; 0.0 for mismatched or zero inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// HashMap-backed knowledge store.
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    records: RwLock<HashMap<String, KnowledgeRecord>>,
    archived: RwLock<HashMap<String, HashSet<String>>>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a record as archived within its project.
    pub async fn archive(&self, project_id: &str, record_id: &str) {
        let mut archived = self.archived.write().await;
        archived
            .entry(project_id.to_string())
            .or_default()
            .insert(record_id.to_string());
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    async fn similarity_search(
        &self,
        request: &SimilaritySearchRequest,
    ) -> AppResult<Vec<RecordHit>> {
        let records = self.records.read().await;
        let needle = request.query_text.to_lowercase();

        let mut hits: Vec<RecordHit> = records
            .values()
            .filter(|r| r.project_id == request.project_id)
            .filter_map(|r| {
                let vector_sim = r
                    .embedding
                    .as_ref()
                    .map(|e| cosine_similarity(&request.query_embedding, e))
                    .unwrap_or(0.0);
                let keyword_hit = !needle.is_empty()
                    && (r.name.to_lowercase().contains(&needle)
                        || r.description.to_lowercase().contains(&needle));
                // Keyword matches are floored at a neutral similarity so
                // records without embeddings still surface.
                let similarity = if keyword_hit {
                    vector_sim.max(0.5)
                } else {
                    vector_sim
                };
                if similarity >= request.match_threshold {
                    Some(RecordHit {
                        record: r.clone(),
                        similarity,
                    })
                } else {
                    None
                }
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(request.match_count);
        Ok(hits)
    }

    async fn pattern_search(
        &self,
        project_id: &str,
        pattern: &str,
    ) -> AppResult<Vec<KnowledgeRecord>> {
        let records = self.records.read().await;
        let needle = pattern.to_lowercase();
        let mut matches: Vec<KnowledgeRecord> = records
            .values()
            .filter(|r| r.project_id == project_id)
            .filter(|r| {
                r.name.to_lowercase().contains(&needle)
                    || r.description.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect();
        // Deterministic order for callers that rank afterwards.
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    async fn list(&self, project_id: &str) -> AppResult<Vec<KnowledgeRecord>> {
        let records = self.records.read().await;
        let mut matches: Vec<KnowledgeRecord> = records
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matches)
    }

    async fn archived_ids(&self, project_id: &str) -> AppResult<HashSet<String>> {
        let archived = self.archived.read().await;
        Ok(archived.get(project_id).cloned().unwrap_or_default())
    }

    async fn get(&self, id: &str) -> AppResult<Option<KnowledgeRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }

    async fn insert(&self, record: NewKnowledgeRecord) -> AppResult<KnowledgeRecord> {
        let stored = KnowledgeRecord {
            id: Uuid::new_v4().to_string(),
            project_id: record.project_id,
            name: record.name,
            description: record.description,
            content: record.content,
            importance: record.importance,
            lookup_count: 0,
            last_used_at: None,
            embedding: record.embedding,
        };
        let mut records = self.records.write().await;
        records.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, record: KnowledgeRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        if !records.contains_key(&record.id) {
            return Err(AppError::not_found(format!("record {}", record.id)));
        }
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        records.remove(id);
        Ok(())
    }

    async fn record_usage(&self, id: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        if let Some(record) = records.get_mut(id) {
            record.lookup_count += 1;
            record.last_used_at = Some(Utc::now());
        }
        Ok(())
    }
}
