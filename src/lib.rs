//! StoryWeave Orchestration Core
//!
//! The conversational task-orchestration core of StoryWeave, a
//! knowledge-assisted writing tool. Given a natural-language request, it
//! decides what kind of work is needed, assembles supporting evidence from
//! the project knowledge store, executes a bounded multi-step plan with
//! dynamic re-planning, and verifies the produced answer against the
//! evidence before releasing it.
//!
//! This crate is a library: the host application supplies the LLM,
//! embedding, storage, context-building, and code-execution collaborators
//! through trait seams and drives one turn at a time:
//!
//! ```text
//! user text -> TurnPlanner -> Plan -> TurnExecutor -> draft (external)
//!           -> Verifier correction loop -> final answer
//! ```

pub mod services;
pub mod utils;

// Provider seams come from the workspace llm crate.
pub use storyweave_llm as llm;

pub use services::executor::{
    BuiltContext, CodeExecutor, CodeOutcome, ContextBuilder, ExecutionOutcome, ExecutorConfig,
    PendingMutation, ReplanAction, ReplanEvent, StepResult, TurnExecutor,
};
pub use services::memory::{Candidate, RetrievalConfig, Retriever};
pub use services::planner::{
    ChapterRangeMode, Intent, MutationOp, MutationTarget, Plan, Step, StepArgs, TurnPlanner,
};
pub use services::session::{ProjectContext, SessionScope};
pub use services::store::{
    InMemoryKnowledgeStore, KnowledgeRecord, KnowledgeStore, NewKnowledgeRecord,
};
pub use services::verifier::{
    ResponseGenerator, VerificationOutcome, Verifier, VerifierConfig,
};
pub use utils::error::{AppError, AppResult};
