//! StoryWeave Core
//!
//! Foundational pieces shared across the StoryWeave workspace:
//!
//! - `error` - Core error types (dependency-free: only thiserror + std)
//! - `json` - Extraction of JSON payloads from LLM responses
//! - `text` - Token estimation and character-safe truncation
//!
//! Heavy-dependency functionality (providers, retrieval, orchestration)
//! lives in the other workspace crates.

pub mod error;
pub mod json;
pub mod text;

pub use error::{CoreError, CoreResult};
pub use json::{extract_json_object, parse_json_object, strip_code_fences};
pub use text::{estimate_tokens, truncate_chars};
