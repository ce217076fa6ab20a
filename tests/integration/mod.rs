//! Integration Tests Module
//!
//! End-to-end tests of the orchestration core: planning, retrieval-backed
//! context building, bounded execution with re-planning, and the
//! verification loop, all over scripted collaborators.

// Shared scripted collaborators (LLM, embedder, context builder)
mod common;

// Retrieval + scoring over the in-memory store
mod retrieval_test;

// Full turn flows: plan -> execute -> verify
mod turn_test;
