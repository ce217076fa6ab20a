//! Full Turn Tests
//!
//! Drive whole turns the way the host turn-handler does: plan the request,
//! execute the plan over a retriever-backed context builder, then run the
//! verification loop over a draft answer.

use std::sync::Arc;

use storyweave::services::memory::Retriever;
use storyweave::{
    InMemoryKnowledgeStore, KnowledgeStore, MutationOp, MutationTarget, NewKnowledgeRecord,
    ProjectContext, SessionScope, TurnExecutor, TurnPlanner, Verifier,
};
use storyweave::Intent;

use crate::common::{
    FixedCodeExecutor, NoEmbedder, RetrievalContextBuilder, ScriptedGenerator, ScriptedProvider,
};

async fn seeded_store() -> Arc<InMemoryKnowledgeStore> {
    let store = Arc::new(InMemoryKnowledgeStore::new());
    store
        .insert(NewKnowledgeRecord {
            project_id: "novel".to_string(),
            name: "[CHARACTER] Mara".to_string(),
            description: "the hero of the story, an only child".to_string(),
            content: String::new(),
            importance: 0.8,
            embedding: None,
        })
        .await
        .unwrap();
    store
}

fn context_builder(store: Arc<InMemoryKnowledgeStore>) -> Arc<RetrievalContextBuilder> {
    Arc::new(RetrievalContextBuilder::new(Retriever::new(
        store,
        Arc::new(NoEmbedder),
    )))
}

const KNOWLEDGE_PLAN: &str = r#"{
    "analysis": "the user asks about Mara",
    "verification_required": false,
    "steps": [
        {"step_id": 1, "intent": "knowledge-search", "args": {"query": "Mara"}}
    ]
}"#;

#[tokio::test]
async fn test_knowledge_turn_end_to_end() {
    let store = seeded_store().await;
    let provider = ScriptedProvider::new(vec![KNOWLEDGE_PLAN, "OK"]);
    let scope = SessionScope::for_project("novel");

    // Plan
    let planner = TurnPlanner::new(provider.clone());
    let plan = planner
        .plan("Who is Mara?", &[], &ProjectContext::default())
        .await;
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.steps[0].intent, Intent::KnowledgeSearch);
    assert!(plan.verification_required);

    // Execute
    let executor = TurnExecutor::new(context_builder(store.clone()), provider.clone());
    let outcome = executor.execute(&plan, "Who is Mara?", &scope).await;
    assert!(outcome.context.contains("[KNOWLEDGE] [CHARACTER] Mara"));
    assert_eq!(outcome.sources.len(), 1);
    assert!(outcome.replan_events.is_empty());

    // Verify a grounded draft
    let verifier = Verifier::new(provider.clone());
    let generator = ScriptedGenerator::new(vec![]);
    let (response, retries) = verifier
        .run_correction_loop(
            "Mara is the hero of the story.",
            &outcome.context,
            &plan.intents(),
            &generator,
            plan.verification_required,
        )
        .await;

    assert_eq!(response, "Mara is the hero of the story.");
    assert_eq!(retries, 0);
    // Planning call + grounding judge call.
    assert_eq!(provider.call_count(), 2);

    // The surfaced record's usage was bumped by the context builder.
    let records = store.list("novel").await.unwrap();
    assert_eq!(records[0].lookup_count, 1);
}

#[tokio::test]
async fn test_mutation_turn_defers_and_skips_verification() {
    let store = seeded_store().await;
    let plan_json = r#"{
        "analysis": "extract characters from chapters 3 to 5",
        "verification_required": false,
        "steps": [
            {"step_id": 1, "intent": "data-mutation", "args": {
                "mutation_op": "extract",
                "mutation_target": "knowledge-entity",
                "chapter_start": 3,
                "chapter_end": 5,
                "range_mode": "explicit"
            }}
        ]
    }"#;
    let provider = ScriptedProvider::new(vec![plan_json]);
    let scope = SessionScope::for_project("novel");

    let planner = TurnPlanner::new(provider.clone());
    let plan = planner
        .plan(
            "Extract the characters from chapters 3 to 5",
            &[],
            &ProjectContext::default(),
        )
        .await;
    assert!(!plan.verification_required);

    let executor = TurnExecutor::new(context_builder(store), provider.clone());
    let outcome = executor
        .execute(&plan, "Extract the characters from chapters 3 to 5", &scope)
        .await;

    assert_eq!(outcome.pending_mutations.len(), 1);
    let mutation = &outcome.pending_mutations[0];
    assert_eq!(mutation.operation, MutationOp::Extract);
    assert_eq!(mutation.target, MutationTarget::KnowledgeEntity);
    assert_eq!(mutation.chapter_range, Some((3, 5)));

    let verifier = Verifier::new(provider.clone());
    let generator = ScriptedGenerator::new(vec![]);
    let (response, retries) = verifier
        .run_correction_loop(
            "Queued the extraction for your confirmation.",
            &outcome.context,
            &plan.intents(),
            &generator,
            plan.verification_required,
        )
        .await;
    assert_eq!(response, "Queued the extraction for your confirmation.");
    assert_eq!(retries, 0);
    // Only the planning call: no context LLM use, no judge.
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn test_numeric_turn_with_correction() {
    let store = seeded_store().await;
    let plan_json = r#"{
        "analysis": "count the total words",
        "verification_required": true,
        "steps": [
            {"step_id": 1, "intent": "numeric-calc", "args": {"query": "total words"}}
        ]
    }"#;
    let provider = ScriptedProvider::new(vec![plan_json, "```python\nresult = 100 + 200\n```"]);
    let scope = SessionScope::for_project("novel");

    let planner = TurnPlanner::new(provider.clone());
    let plan = planner
        .plan("How many words in total?", &[], &ProjectContext::default())
        .await;

    let executor = TurnExecutor::new(context_builder(store), provider.clone())
        .with_code_executor(Arc::new(FixedCodeExecutor {
            value: "300".to_string(),
        }));
    let outcome = executor
        .execute(&plan, "How many words in total?", &scope)
        .await;
    assert!(outcome.context.contains("computed result: 300"));

    // A draft that contradicts the computed result gets corrected once.
    let verifier = Verifier::new(provider.clone());
    let generator = ScriptedGenerator::new(vec!["The total is 300 words."]);
    let (response, retries) = verifier
        .run_correction_loop(
            "The total is 320 words.",
            &outcome.context,
            &plan.intents(),
            &generator,
            plan.verification_required,
        )
        .await;

    assert_eq!(response, "The total is 300 words.");
    assert_eq!(retries, 1);
}

#[tokio::test]
async fn test_degraded_planning_still_answers() {
    let store = seeded_store().await;
    // Both the planning call and the router return garbage.
    let provider = ScriptedProvider::new(vec!["no json here", "still no json"]);
    let scope = SessionScope::for_project("novel");

    let planner = TurnPlanner::new(provider.clone());
    let plan = planner
        .plan("hello there", &[], &ProjectContext::default())
        .await;
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.steps[0].intent, Intent::CasualChat);
    assert!(!plan.verification_required);

    let executor = TurnExecutor::new(context_builder(store), provider.clone());
    let outcome = executor.execute(&plan, "hello there", &scope).await;
    assert_eq!(outcome.step_results.len(), 1);

    let verifier = Verifier::new(provider);
    let generator = ScriptedGenerator::new(vec![]);
    let (response, retries) = verifier
        .run_correction_loop(
            "Hi! How can I help with your story?",
            &outcome.context,
            &plan.intents(),
            &generator,
            plan.verification_required,
        )
        .await;
    assert_eq!(response, "Hi! How can I help with your story?");
    assert_eq!(retries, 0);
}

#[tokio::test]
async fn test_failed_search_triggers_one_replan() {
    // Empty store: the knowledge-search step finds nothing and the
    // re-planner is consulted exactly once for it.
    let store = Arc::new(InMemoryKnowledgeStore::new());
    let plan_json = r#"{
        "analysis": "two lookups",
        "verification_required": false,
        "steps": [
            {"step_id": 1, "intent": "knowledge-search", "args": {"query": "Mara"}},
            {"step_id": 2, "intent": "knowledge-search", "args": {"query": "Io"}}
        ]
    }"#;
    let provider = ScriptedProvider::new(vec![
        plan_json,
        r#"{"action": "continue", "reason": "second lookup may still work"}"#,
    ]);
    let scope = SessionScope::for_project("novel");

    let planner = TurnPlanner::new(provider.clone());
    let plan = planner
        .plan("Who are Mara and Io?", &[], &ProjectContext::default())
        .await;

    let executor = TurnExecutor::new(context_builder(store), provider.clone());
    let outcome = executor.execute(&plan, "Who are Mara and Io?", &scope).await;

    assert_eq!(outcome.replan_events.len(), 1);
    assert_eq!(outcome.replan_events[0].step_id, 1);
    assert_eq!(outcome.step_results.len(), 2);
    // Planning call + one re-planning consult; the second failed step has
    // no remaining steps, so no second consult.
    assert_eq!(provider.call_count(), 2);
}
