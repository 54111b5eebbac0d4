//! # LLM Provider Interface
//!
//! A trait-based abstraction for communicating with LLM backends.
//!
//! ## Design
//! - `LlmProvider` trait defines the core interface
//! - Implementations for OpenAI-compatible APIs (Groq) and Google Gemini
//! - `AnyProvider` picks one of them at runtime from a `ProviderConfig`
//! - Usage tracking

pub mod any;
pub mod gemini;
pub mod openai;

pub use any::AnyProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use omni_error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Shape the reply should take
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// Ask the provider to force a single JSON object
    Json,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub stop: Option<Vec<String>>,
    pub response_format: ResponseFormat,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Invalid request
    InvalidRequest(String),
    /// Model not found
    ModelNotFound(String),
    /// Authentication failed
    AuthenticationFailed,
    /// No API key configured; holds the environment variable that supplies it
    MissingApiKey(&'static str),
    /// Other error
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::InvalidRequest(e) => write!(f, "Invalid request: {}", e),
            Self::ModelNotFound(m) => write!(f, "Model not found: {}", m),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::MissingApiKey(var) => write!(f, "{} is missing", var),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Convert into the unified error, keeping the provider error as source
    pub fn into_error(self) -> Error {
        let err = match &self {
            Self::Network(msg) => Error::new(ErrorKind::NetworkFailed, msg.clone()),
            Self::Api { status, .. } if *status >= 500 => {
                Error::new(ErrorKind::ProviderUnavailable, self.to_string())
                    .with_context("http_status", status.to_string())
            }
            Self::Api { status, .. } => Error::new(ErrorKind::InferenceFailed, self.to_string())
                .with_context("http_status", status.to_string())
                .permanent(),
            Self::Parse(msg) => Error::parse_failed(msg.clone()),
            Self::RateLimited { retry_after } => {
                let err = Error::new(ErrorKind::RateLimited, self.to_string());
                match retry_after {
                    Some(secs) => err.with_context("retry_after", secs.to_string()),
                    None => err,
                }
            }
            Self::InvalidRequest(msg) => Error::invalid_argument(msg.clone()),
            Self::ModelNotFound(model) => Error::config_invalid(self.to_string())
                .with_context("model", model.clone()),
            Self::AuthenticationFailed => {
                Error::new(ErrorKind::AuthenticationFailed, self.to_string())
            }
            Self::MissingApiKey(var) => return Error::credentials_missing(*var),
            Self::Other(msg) => Error::inference_failed(msg.clone()),
        };
        err.with_operation("provider::complete").set_source(self)
    }

    /// Map a non-success HTTP status onto a provider error
    pub(crate) fn from_status(
        status: u16,
        retry_after: Option<u64>,
        body: String,
        model: &str,
    ) -> Self {
        match status {
            401 | 403 => Self::AuthenticationFailed,
            404 => Self::ModelNotFound(model.to_string()),
            429 => Self::RateLimited { retry_after },
            _ => Self::Api {
                status,
                message: body,
            },
        }
    }
}

/// Read a `retry-after` header given in whole seconds
pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "groq", "gemini")
    fn name(&self) -> &str;

    /// Get available models
    fn models(&self) -> Vec<String>;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Environment variable that supplies the API key
    fn api_key_env(&self) -> &'static str;

    /// Whether credentials are present, so a request can be sent at all
    fn is_configured(&self) -> bool;

    /// Send a completion request and get a full response
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Simple prompt -> response helper
    async fn prompt(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(vec![ChatMessage::user(prompt)]);
        let response = self.complete(request).await?;
        response.content.ok_or_else(|| ProviderError::Other("No content in response".into()))
    }

    /// Chat with message history
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let request = CompletionRequest::new(messages);
        let response = self.complete(request).await?;
        response.content.ok_or_else(|| ProviderError::Other("No content in response".into()))
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-flash-latest";

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Groq,
    Gemini,
    OpenAICompatible,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Groq => "groq",
            ProviderType::Gemini => "gemini",
            ProviderType::OpenAICompatible => "openai",
        }
    }

    /// Human-facing name used in error messages
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderType::Groq => "Groq",
            ProviderType::Gemini => "Gemini",
            ProviderType::OpenAICompatible => "OpenAI",
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            ProviderType::Groq => "GROQ_API_KEY",
            ProviderType::Gemini => "GEMINI_API_KEY",
            ProviderType::OpenAICompatible => "OPENAI_API_KEY",
        }
    }

    /// Hosted backends refuse anonymous requests; self-hosted compatible
    /// servers usually don't care
    pub fn requires_api_key(&self) -> bool {
        !matches!(self, ProviderType::OpenAICompatible)
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(ProviderType::Groq),
            "gemini" | "google" => Ok(ProviderType::Gemini),
            "openai" | "openai-compatible" => Ok(ProviderType::OpenAICompatible),
            other => Err(Error::config_invalid(format!("unknown provider '{}'", other))
                .with_context("provider", other.to_string())),
        }
    }
}

impl ProviderConfig {
    /// Groq-hosted Llama through the OpenAI-compatible endpoint
    pub fn groq(api_key: Option<String>) -> Self {
        Self {
            provider_type: ProviderType::Groq,
            api_key,
            base_url: Some(GROQ_BASE_URL.into()),
            default_model: Some(GROQ_DEFAULT_MODEL.into()),
            headers: HashMap::new(),
            timeout_secs: Some(120),
        }
    }

    pub fn gemini(api_key: Option<String>) -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            api_key,
            base_url: Some(GEMINI_BASE_URL.into()),
            default_model: Some(GEMINI_DEFAULT_MODEL.into()),
            headers: HashMap::new(),
            timeout_secs: Some(120),
        }
    }

    /// Any other server speaking the OpenAI chat completions API
    pub fn openai_compatible(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAICompatible,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            headers: HashMap::new(),
            timeout_secs: Some(300),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// The API key, if one is set and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn is_configured(&self) -> bool {
        !self.provider_type.requires_api_key() || self.api_key().is_some()
    }

    pub(crate) fn http_client(&self) -> Result<reqwest::Client, ProviderError> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.timeout_secs.unwrap_or(120)))
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to create HTTP client: {}", e)))
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================
