//! The `solve` request as it arrives from clients

use omni_error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Accepts both `{prompt, language}` and `{problem, code}` shaped bodies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SolveRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Default::default()
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// `prompt` wins over `problem`; empty strings count as absent
    pub fn prompt_text(&self) -> &str {
        [&self.prompt, &self.problem]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|p| !p.is_empty())
            .unwrap_or("")
    }

    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or("auto")
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Reject requests with nothing to solve
    pub fn validate(&self) -> Result<()> {
        if self.prompt_text().trim().is_empty() {
            return Err(Error::invalid_argument("prompt is empty")
                .with_operation("solve::validate"));
        }
        Ok(())
    }
}
