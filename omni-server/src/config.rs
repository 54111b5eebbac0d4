//! Command-line and environment configuration

use clap::{Args, Parser};
use omni_coder::{Coder, CoderConfig};
use omni_error::{Error, Result};
use omni_llm::{AnyProvider, ProviderConfig, ProviderType};
use std::path::PathBuf;

/// Which model backend to talk to, and how
#[derive(Args, Debug, Clone)]
pub struct LlmArgs {
    /// Model backend: groq, gemini or openai (any OpenAI-compatible server)
    #[arg(long, env = "OMNI_PROVIDER", default_value = "groq", global = true)]
    pub provider: String,

    /// Model name; defaults to the backend's default model
    #[arg(long, env = "OMNI_MODEL", global = true)]
    pub model: Option<String>,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true, global = true)]
    pub groq_api_key: Option<String>,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    /// Override the backend's API base URL
    #[arg(long, env = "OMNI_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Extra attempts for rate limits, timeouts and 5xx answers
    #[arg(long, env = "OMNI_MAX_RETRIES", default_value_t = 0, global = true)]
    pub max_retries: u32,
}

impl Default for LlmArgs {
    fn default() -> Self {
        Self {
            provider: ProviderType::Groq.as_str().to_string(),
            model: None,
            groq_api_key: None,
            gemini_api_key: None,
            openai_api_key: None,
            base_url: None,
            max_retries: 0,
        }
    }
}

impl LlmArgs {
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let provider_type: ProviderType = self.provider.parse()?;

        let mut config = match provider_type {
            ProviderType::Groq => ProviderConfig::groq(self.groq_api_key.clone()),
            ProviderType::Gemini => ProviderConfig::gemini(self.gemini_api_key.clone()),
            ProviderType::OpenAICompatible => {
                let base_url = self.base_url.clone().ok_or_else(|| {
                    Error::config_invalid("the openai provider needs --base-url")
                        .with_operation("config::provider")
                })?;
                let model = self.model.clone().ok_or_else(|| {
                    Error::config_invalid("the openai provider needs --model")
                        .with_operation("config::provider")
                })?;
                let config = ProviderConfig::openai_compatible(base_url, model);
                match &self.openai_api_key {
                    Some(key) => config.with_api_key(key.clone()),
                    None => config,
                }
            }
        };

        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        Ok(config)
    }

    pub fn coder_config(&self) -> CoderConfig {
        CoderConfig::default().with_max_retries(self.max_retries)
    }

    /// Build the coder. A missing API key is not an error here; requests
    /// report it instead.
    pub fn build_coder(&self) -> Result<Coder<AnyProvider>> {
        let provider =
            AnyProvider::from_config(self.provider_config()?).map_err(|e| e.into_error())?;
        Ok(Coder::with_config(provider, self.coder_config()))
    }
}

/// Where to listen
#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    #[arg(long, env = "OMNI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "OMNI_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "OMNI_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    pub body_limit: usize,
}

pub const DEFAULT_BODY_LIMIT: usize = 256 * 1024;

impl Default for ListenArgs {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ListenArgs {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "omni-server")]
#[command(author, version, about = "Omni Coder HTTP API")]
pub struct ServerConfig {
    #[command(flatten)]
    pub llm: LlmArgs,

    #[command(flatten)]
    pub listen: ListenArgs,
}

/// Load `.env.local`, then `.env`, from the working directory.
///
/// Variables already set win over both files, and `.env.local` wins over
/// `.env`. Returns the files that were read; missing files are skipped.
/// Runs before logging is set up, so failures are returned, not logged.
pub fn load_dotenv() -> (Vec<PathBuf>, Vec<String>) {
    let mut loaded = Vec::new();
    let mut failures = Vec::new();

    for file in [".env.local", ".env"] {
        match dotenvy::from_filename(file) {
            Ok(path) => loaded.push(path),
            Err(e) if e.not_found() => {}
            Err(e) => failures.push(format!("{}: {}", file, e)),
        }
    }

    (loaded, failures)
}
