//! Plan Execution
//!
//! The per-turn execution state machine and its collaborators:
//!
//! - `markers` - The context marker contract
//! - `context` - External seams (context builder, code execution)
//! - `types` - Audit records, pending mutations, configuration
//! - `evaluator` - Pure per-intent step-outcome classification
//! - `replanner` - The continue/replace/abort consult
//! - `executor` - The bounded execution loop

pub mod context;
pub mod evaluator;
pub mod executor;
pub mod markers;
pub mod replanner;
pub mod types;

pub use context::{BuiltContext, CodeExecutor, CodeOutcome, ContextBuilder};
pub use evaluator::evaluate;
pub use executor::TurnExecutor;
pub use replanner::{ReplanDecision, Replanner};
pub use types::{
    ExecutionOutcome, ExecutorConfig, PendingMutation, ReplanAction, ReplanEvent, StepResult,
};
