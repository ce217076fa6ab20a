//! StoryWeave LLM
//!
//! LLM and embedding provider abstraction for the StoryWeave workspace:
//!
//! - `types` - Messages, request options, responses, and the error taxonomy
//! - `provider` - The `LlmProvider` and `EmbeddingProvider` traits
//! - `openai` - An OpenAI-compatible chat-completions implementation
//!
//! The orchestration core only ever talks to the traits; concrete providers
//! are wired in by the host application.

pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiProvider;
pub use provider::{missing_api_key_error, parse_http_error, EmbeddingProvider, LlmProvider};
pub use types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, ProviderConfig,
    UsageStats,
};
