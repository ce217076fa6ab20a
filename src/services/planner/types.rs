//! Plan Types
//!
//! Data structures for the turn-planning layer: the closed intent
//! enumeration, canonicalized step arguments, and the Plan itself.
//! Intent is a closed tagged enum; every system boundary goes through
//! `Intent::parse` (or the planner's coercion table) rather than
//! dispatching on raw strings.

use serde::{Deserialize, Serialize};

// ============================================================================
// Intent
// ============================================================================

/// What kind of work a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    /// Ask the user a clarifying question
    Clarify,
    /// Look something up on the web
    WebLookup,
    /// Numeric computation over story data
    NumericCalc,
    /// Create/update/delete knowledge (deferred to the mutation runner)
    DataMutation,
    /// Read chapter or document content
    ReadContent,
    /// Query the story timeline
    TimelineQuery,
    /// Structured query over tagged story data
    StructuredQuery,
    /// Combined retrieval across several context kinds
    MixedContext,
    /// Search chapter fragments
    FragmentSearch,
    /// Search the knowledge store
    KnowledgeSearch,
    /// Propose a multi-step approach to the user
    SuggestMultistep,
    /// General conversation
    CasualChat,
}

impl Intent {
    /// Canonical string tag for this intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Clarify => "clarify",
            Intent::WebLookup => "web-lookup",
            Intent::NumericCalc => "numeric-calc",
            Intent::DataMutation => "data-mutation",
            Intent::ReadContent => "read-content",
            Intent::TimelineQuery => "timeline-query",
            Intent::StructuredQuery => "structured-query",
            Intent::MixedContext => "mixed-context",
            Intent::FragmentSearch => "fragment-search",
            Intent::KnowledgeSearch => "knowledge-search",
            Intent::SuggestMultistep => "suggest-multistep",
            Intent::CasualChat => "casual-chat",
        }
    }

    /// Parse a canonical tag. Unknown strings yield `None`; synonym
    /// remapping lives in the planner's normalization layer.
    pub fn parse(raw: &str) -> Option<Intent> {
        match raw.trim() {
            "clarify" => Some(Intent::Clarify),
            "web-lookup" => Some(Intent::WebLookup),
            "numeric-calc" => Some(Intent::NumericCalc),
            "data-mutation" => Some(Intent::DataMutation),
            "read-content" => Some(Intent::ReadContent),
            "timeline-query" => Some(Intent::TimelineQuery),
            "structured-query" => Some(Intent::StructuredQuery),
            "mixed-context" => Some(Intent::MixedContext),
            "fragment-search" => Some(Intent::FragmentSearch),
            "knowledge-search" => Some(Intent::KnowledgeSearch),
            "suggest-multistep" => Some(Intent::SuggestMultistep),
            "casual-chat" => Some(Intent::CasualChat),
            _ => None,
        }
    }

    /// Intents whose answers must be verified against the assembled context.
    pub fn is_verification_sensitive(&self) -> bool {
        matches!(
            self,
            Intent::NumericCalc
                | Intent::TimelineQuery
                | Intent::ReadContent
                | Intent::FragmentSearch
                | Intent::KnowledgeSearch
                | Intent::MixedContext
                | Intent::StructuredQuery
        )
    }

    /// One-off lookups whose full output would pollute downstream steps;
    /// the executor records them in the step result but adds only a marker
    /// note to the cumulative context.
    pub fn is_independent(&self) -> bool {
        matches!(
            self,
            Intent::StructuredQuery | Intent::WebLookup | Intent::Clarify | Intent::CasualChat
        )
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Mutation descriptors
// ============================================================================

/// Operation type of a data mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOp {
    Extract,
    Update,
    Delete,
    Remember,
}

impl MutationOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationOp::Extract => "extract",
            MutationOp::Update => "update",
            MutationOp::Delete => "delete",
            MutationOp::Remember => "remember",
        }
    }

    pub fn parse(raw: &str) -> Option<MutationOp> {
        match raw.trim() {
            "extract" => Some(MutationOp::Extract),
            "update" => Some(MutationOp::Update),
            "delete" => Some(MutationOp::Delete),
            "remember" => Some(MutationOp::Remember),
            _ => None,
        }
    }
}

impl std::fmt::Display for MutationOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target of a data mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationTarget {
    KnowledgeEntity,
    Relation,
    Timeline,
    Segmentation,
    Rule,
}

impl MutationTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationTarget::KnowledgeEntity => "knowledge-entity",
            MutationTarget::Relation => "relation",
            MutationTarget::Timeline => "timeline",
            MutationTarget::Segmentation => "segmentation",
            MutationTarget::Rule => "rule",
        }
    }

    pub fn parse(raw: &str) -> Option<MutationTarget> {
        match raw.trim() {
            "knowledge-entity" => Some(MutationTarget::KnowledgeEntity),
            "relation" => Some(MutationTarget::Relation),
            "timeline" => Some(MutationTarget::Timeline),
            "segmentation" => Some(MutationTarget::Segmentation),
            "rule" => Some(MutationTarget::Rule),
            _ => None,
        }
    }

    /// Targets that are handed to the background mutation runner instead of
    /// executing inline.
    pub fn defers_execution(&self) -> bool {
        !matches!(self, MutationTarget::Rule)
    }
}

impl std::fmt::Display for MutationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a chapter range was expressed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChapterRangeMode {
    /// Explicit start..end range
    Explicit,
    /// The first N chapters
    FirstN,
    /// The last N chapters
    LastN,
    /// No range given
    #[default]
    None,
}

impl ChapterRangeMode {
    pub fn parse(raw: &str) -> Option<ChapterRangeMode> {
        match raw.trim() {
            "explicit" => Some(ChapterRangeMode::Explicit),
            "first-n" => Some(ChapterRangeMode::FirstN),
            "last-n" => Some(ChapterRangeMode::LastN),
            "none" => Some(ChapterRangeMode::None),
            _ => None,
        }
    }
}

// ============================================================================
// Step arguments
// ============================================================================

/// Canonicalized arguments for one step. Every field is optional; absence
/// is meaningful rather than an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepArgs {
    /// Refined query text
    pub query: Option<String>,
    /// Target file/document references
    pub documents: Vec<String>,
    /// Target entity references
    pub entities: Vec<String>,
    /// Chapter range start (1-based)
    pub chapter_start: Option<u32>,
    /// Chapter range end (inclusive)
    pub chapter_end: Option<u32>,
    /// How the range was expressed
    pub range_mode: ChapterRangeMode,
    /// Inferred category tags for category-aware retrieval
    pub categories: Vec<String>,
    /// Mutation operation type
    pub mutation_op: Option<MutationOp>,
    /// Mutation target
    pub mutation_target: Option<MutationTarget>,
    /// Target tag for structured queries
    pub structured_target: Option<String>,
    /// Clarification question text
    pub clarification: Option<String>,
    /// Free-form update summary
    pub update_summary: Option<String>,
}

impl StepArgs {
    /// Enforce `chapter_start <= chapter_end` by swapping when inverted.
    pub fn normalize_range(&mut self) {
        if let (Some(start), Some(end)) = (self.chapter_start, self.chapter_end) {
            if start > end {
                self.chapter_start = Some(end);
                self.chapter_end = Some(start);
            }
        }
    }
}

// ============================================================================
// Step & Plan
// ============================================================================

/// One unit of work in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position in the plan
    pub step_id: u32,
    pub intent: Intent,
    #[serde(default)]
    pub args: StepArgs,
    /// Advisory only: the executor never gates on it; steps run strictly
    /// in list order.
    #[serde(default)]
    pub dependency: Option<u32>,
}

impl Step {
    pub fn new(step_id: u32, intent: Intent, args: StepArgs) -> Self {
        Self {
            step_id,
            intent,
            args,
            dependency: None,
        }
    }
}

/// An ordered plan for one user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// The planner's free-text reading of the request
    pub analysis: String,
    /// Non-empty, executed strictly in order
    pub steps: Vec<Step>,
    /// Whether the final answer goes through the verification loop
    pub verification_required: bool,
}

impl Plan {
    /// Build a plan, deriving `verification_required` from the requested
    /// flag OR the presence of any verification-sensitive intent.
    pub fn new(analysis: impl Into<String>, steps: Vec<Step>, requested: bool) -> Self {
        let verification_required = requested || steps_require_verification(&steps);
        Self {
            analysis: analysis.into(),
            steps,
            verification_required,
        }
    }

    /// A one-step plan.
    pub fn single(analysis: impl Into<String>, intent: Intent, args: StepArgs) -> Self {
        Self::new(analysis, vec![Step::new(1, intent, args)], false)
    }

    /// The distinct intents present, in step order.
    pub fn intents(&self) -> Vec<Intent> {
        let mut seen = Vec::new();
        for step in &self.steps {
            if !seen.contains(&step.intent) {
                seen.push(step.intent);
            }
        }
        seen
    }
}

/// True iff any step carries a verification-sensitive intent.
pub fn steps_require_verification(steps: &[Step]) -> bool {
    steps.iter().any(|s| s.intent.is_verification_sensitive())
}
