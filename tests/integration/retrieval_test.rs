//! Retrieval Integration Tests
//!
//! The hybrid retriever over the in-memory store, exercised through the
//! public API: fallback search, archived filtering, deterministic ranking,
//! and the usage side effect.

use std::sync::Arc;

use storyweave::services::memory::Retriever;
use storyweave::{InMemoryKnowledgeStore, KnowledgeStore, NewKnowledgeRecord, SessionScope};

use crate::common::NoEmbedder;

async fn seed(
    store: &InMemoryKnowledgeStore,
    name: &str,
    description: &str,
    importance: f32,
) -> String {
    store
        .insert(NewKnowledgeRecord {
            project_id: "novel".to_string(),
            name: name.to_string(),
            description: description.to_string(),
            content: String::new(),
            importance,
            embedding: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn test_fallback_search_returns_neutral_similarity() {
    let store = Arc::new(InMemoryKnowledgeStore::new());
    seed(&store, "A", "hero", 0.0).await;
    seed(&store, "B", "villain", 0.0).await;

    let retriever = Retriever::new(store, Arc::new(NoEmbedder));
    let scope = SessionScope::for_project("novel");
    let results = retriever
        .search("Tell me about character A", &scope, 10, &[])
        .await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.name, "A");
    assert!((results[0].vector_sim - 0.5).abs() < 1e-6);
    assert!((results[0].final_score - 0.35).abs() < 1e-6);
}

#[tokio::test]
async fn test_ranking_is_deterministic() {
    let store = Arc::new(InMemoryKnowledgeStore::new());
    for i in 0..5 {
        seed(&store, &format!("Mara {i}"), "the hero", 0.5).await;
    }
    let retriever = Retriever::new(store, Arc::new(NoEmbedder));
    let scope = SessionScope::for_project("novel");

    let first: Vec<String> = retriever
        .search("Mara", &scope, 10, &[])
        .await
        .into_iter()
        .map(|c| c.record.name)
        .collect();
    let second: Vec<String> = retriever
        .search("Mara", &scope, 10, &[])
        .await
        .into_iter()
        .map(|c| c.record.name)
        .collect();

    assert_eq!(first, second);
    assert_eq!(first.len(), 5);
}

#[tokio::test]
async fn test_archived_records_never_surface() {
    let store = Arc::new(InMemoryKnowledgeStore::new());
    let keep = seed(&store, "Mara", "the hero", 0.5).await;
    let gone = seed(&store, "Mara the elder", "ancestor", 0.5).await;
    store.archive("novel", &gone).await;

    let retriever = Retriever::new(store, Arc::new(NoEmbedder));
    let scope = SessionScope::for_project("novel");
    let results = retriever.search("Mara", &scope, 10, &[]).await;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.id, keep);
}

#[tokio::test]
async fn test_importance_breaks_score_order() {
    let store = Arc::new(InMemoryKnowledgeStore::new());
    seed(&store, "Mara minor", "mara appears briefly", 0.1).await;
    seed(&store, "Mara major", "mara carries the plot", 0.9).await;

    let retriever = Retriever::new(store, Arc::new(NoEmbedder));
    let scope = SessionScope::for_project("novel");
    let results = retriever.search("mara", &scope, 10, &[]).await;

    assert_eq!(results[0].record.name, "Mara major");
    assert!(results[0].final_score > results[1].final_score);
}

#[tokio::test]
async fn test_usage_bump_is_observable() {
    let store = Arc::new(InMemoryKnowledgeStore::new());
    let id = seed(&store, "Mara", "the hero", 0.5).await;

    let retriever = Retriever::new(store.clone(), Arc::new(NoEmbedder));
    let scope = SessionScope::for_project("novel");
    let results = retriever.search("Mara", &scope, 10, &[]).await;
    retriever.mark_used(&results).await;

    let record = store.get(&id).await.unwrap().unwrap();
    assert_eq!(record.lookup_count, 1);
}
