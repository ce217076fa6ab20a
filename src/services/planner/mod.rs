//! Turn Planning
//!
//! Turns a free-text request into a validated multi-step `Plan`:
//!
//! - `types` - Intent enumeration, step arguments, Step and Plan
//! - `prompts` - The fixed planning and router instruction sets
//! - `normalize` - Total validation of raw LLM output into a Plan
//! - `heuristics` - Advisory pattern signals fed into the prompt
//! - `planner` - The LLM-backed `TurnPlanner` with its fallback ladder

pub mod heuristics;
pub mod normalize;
pub mod planner;
pub mod prompts;
pub mod types;

pub use planner::{fallback_plan, TurnPlanner};
pub use types::{
    steps_require_verification, ChapterRangeMode, Intent, MutationOp, MutationTarget, Plan, Step,
    StepArgs,
};
