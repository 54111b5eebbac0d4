//! # omni-llm
//!
//! Provider layer for Omni Coder. Every "solve" and every simulated "run" is
//! a single chat completion against a hosted model; this crate owns the
//! request/response types and the HTTP clients.
//!
//! ## Core Concepts
//! - **LlmProvider**: trait-based LLM communication
//! - **OpenAIProvider**: OpenAI-compatible chat completions (Groq by default)
//! - **GeminiProvider**: Google Gemini `generateContent`
//! - **AnyProvider**: runtime choice between the two backends

pub mod provider;

pub use omni_error::{Error, ErrorKind, ErrorStatus, Result};
pub use provider::{
    AnyProvider, ChatMessage, CompletionRequest, CompletionResponse, FinishReason,
    GeminiProvider, LlmProvider, OpenAIProvider, ProviderConfig, ProviderError, ProviderType,
    ResponseFormat, Role, Usage, UsageTracker,
};
