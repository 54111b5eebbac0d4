//! Runtime-selected provider
//!
//! `LlmProvider` uses `async fn`, so it cannot be a trait object. The two
//! backends are interchangeable, never composed, so an enum does the job.

use super::*;

pub enum AnyProvider {
    OpenAI(OpenAIProvider),
    Gemini(GeminiProvider),
}

impl AnyProvider {
    /// Build the backend named by `config.provider_type`
    pub fn from_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        match config.provider_type {
            ProviderType::Groq | ProviderType::OpenAICompatible => {
                Ok(Self::OpenAI(OpenAIProvider::new(config)?))
            }
            ProviderType::Gemini => Ok(Self::Gemini(GeminiProvider::new(config)?)),
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        match self {
            Self::OpenAI(p) => p.config(),
            Self::Gemini(p) => p.config(),
        }
    }

    pub fn provider_type(&self) -> ProviderType {
        self.config().provider_type
    }
}

impl From<OpenAIProvider> for AnyProvider {
    fn from(provider: OpenAIProvider) -> Self {
        Self::OpenAI(provider)
    }
}

impl From<GeminiProvider> for AnyProvider {
    fn from(provider: GeminiProvider) -> Self {
        Self::Gemini(provider)
    }
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::OpenAI(p) => p.name(),
            Self::Gemini(p) => p.name(),
        }
    }

    fn models(&self) -> Vec<String> {
        match self {
            Self::OpenAI(p) => p.models(),
            Self::Gemini(p) => p.models(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::OpenAI(p) => p.default_model(),
            Self::Gemini(p) => p.default_model(),
        }
    }

    fn api_key_env(&self) -> &'static str {
        match self {
            Self::OpenAI(p) => p.api_key_env(),
            Self::Gemini(p) => p.api_key_env(),
        }
    }

    fn is_configured(&self) -> bool {
        match self {
            Self::OpenAI(p) => p.is_configured(),
            Self::Gemini(p) => p.is_configured(),
        }
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        match self {
            Self::OpenAI(p) => p.complete(request).await,
            Self::Gemini(p) => p.complete(request).await,
        }
    }
}
