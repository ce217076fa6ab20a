//! Memory Retrieval
//!
//! Hybrid retrieval and reranking over the project knowledge store:
//!
//! - `scorer` - The weighted relevance formula and candidate ranking
//! - `retrieval` - Vector-first search with pattern fallback and archived
//!   filtering

pub mod retrieval;
pub mod scorer;

pub use retrieval::{RetrievalConfig, Retriever};
pub use scorer::{
    baseline_score, category_score, category_tag, recency_bonus, score_candidates, Candidate,
};
