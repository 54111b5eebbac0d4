//! Google Gemini provider implementation
//!
//! Uses the `generateContent` REST endpoint. System messages travel as
//! `systemInstruction`; assistant turns use the `model` role.

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = config.http_client()?;
        Ok(Self { client, config })
    }

    pub fn with_key(api_key: Option<String>) -> Result<Self, ProviderError> {
        Self::new(ProviderConfig::gemini(api_key))
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or(GEMINI_BASE_URL)
            .trim_end_matches('/')
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn models(&self) -> Vec<String> {
        vec![
            "gemini-flash-latest".into(),
            "gemini-2.5-flash".into(),
            "gemini-2.5-pro".into(),
            "gemini-2.0-flash".into(),
        ]
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or(GEMINI_DEFAULT_MODEL)
    }

    fn api_key_env(&self) -> &'static str {
        ProviderType::Gemini.api_key_env()
    }

    fn is_configured(&self) -> bool {
        self.config.api_key().is_some()
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let api_key = self
            .config
            .api_key()
            .ok_or(ProviderError::MissingApiKey(self.api_key_env()))?;

        let model = request.model.as_deref().unwrap_or(self.default_model());
        let api_request = GeminiRequest::from_completion(&request);

        debug!(
            provider = "gemini",
            model,
            contents = api_request.contents.len(),
            "sending generateContent"
        );

        let mut req = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url(), model))
            .header("x-goog-api-key", api_key)
            .json(&api_request);

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = retry_after_secs(response.headers());
            let text = response.text().await.unwrap_or_default();
            // Gemini answers a bad key with 400 INVALID_ARGUMENT
            if status == 400 && text.contains("API_KEY_INVALID") {
                return Err(ProviderError::AuthenticationFailed);
            }
            return Err(ProviderError::from_status(status, retry_after, text, model));
        }

        let api_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        let candidate = api_response
            .candidates
            .first()
            .ok_or_else(|| ProviderError::Other("No candidates in response".into()))?;

        let content = candidate.content.as_ref().map(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        });

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        let usage = api_response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }).unwrap_or_default();

        Ok(CompletionResponse {
            id: api_response.response_id.unwrap_or_default(),
            model: api_response.model_version.unwrap_or_else(|| model.to_string()),
            content,
            finish_reason,
            usage,
        })
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

impl GeminiRequest {
    fn from_completion(request: &CompletionRequest) -> Self {
        let system_text: Vec<&str> = request
            .messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let system_instruction = (!system_text.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![GeminiPart::text(system_text.join("\n\n"))],
        });

        let contents = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| GeminiContent {
                role: Some(match m.role {
                    Role::Assistant => "model".into(),
                    _ => "user".into(),
                }),
                parts: vec![GeminiPart::text(m.content.clone())],
            })
            .collect();

        Self {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                stop_sequences: request.stop.clone(),
                response_mime_type: match request.response_format {
                    ResponseFormat::Json => Some("application/json".into()),
                    ResponseFormat::Text => None,
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    model_version: Option<String>,
    response_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("You are Omni Coder"),
            ChatMessage::user("reverse a list"),
            ChatMessage::assistant("sure"),
        ])
        .with_temperature(0.1)
        .with_max_tokens(2048)
        .with_response_format(ResponseFormat::Json);

        let body = serde_json::to_value(GeminiRequest::from_completion(&request)).unwrap();

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are Omni Coder");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["contents"].as_array().unwrap().len(), 2);
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body["generationConfig"].get("stopSequences").is_none());
    }

    #[tokio::test]
    async fn test_complete_joins_parts() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-flash-latest:generateContent")
                    .header("x-goog-api-key", "AIza-test");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [{ "text": "Hello, " }, { "text": "world" }]
                        },
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": {
                        "promptTokenCount": 4,
                        "candidatesTokenCount": 2,
                        "totalTokenCount": 6
                    },
                    "modelVersion": "gemini-2.5-flash",
                    "responseId": "resp-1"
                }));
            })
            .await;

        let config =
            ProviderConfig::gemini(Some("AIza-test".into())).with_base_url(server.base_url());
        let provider = GeminiProvider::new(config).unwrap();
        let response = provider
            .complete(CompletionRequest::new(vec![ChatMessage::user("Hello, just say OK.")]))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(response.content.as_deref(), Some("Hello, world"));
        assert_eq!(response.model, "gemini-2.5-flash");
        assert_eq!(response.finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.total_tokens, 6);
    }

    #[tokio::test]
    async fn test_invalid_key_maps_to_auth_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(400).body(
                    r#"{"error":{"status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#,
                );
            })
            .await;

        let config = ProviderConfig::gemini(Some("bad".into())).with_base_url(server.base_url());
        let provider = GeminiProvider::new(config).unwrap();
        let err = provider.prompt("hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::AuthenticationFailed));
    }

    #[test]
    fn test_missing_key() {
        let provider = GeminiProvider::with_key(None).unwrap();
        let err = tokio_test::block_on(provider.prompt("hi")).unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey("GEMINI_API_KEY")));
    }
}
