//! A provider that replays canned replies, for unit tests

use omni_llm::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ProviderError, Usage,
};
use std::collections::VecDeque;
use std::sync::Mutex;

pub(crate) struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Option<String>, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    configured: bool,
}

impl ScriptedProvider {
    pub(crate) fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            configured: true,
        }
    }

    pub(crate) fn reply(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Ok(Some(text.into())));
        self
    }

    pub(crate) fn no_content(self) -> Self {
        self.script.lock().unwrap().push_back(Ok(None));
        self
    }

    pub(crate) fn fail(self, err: ProviderError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    pub(crate) fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn models(&self) -> Vec<String> {
        vec!["scripted-model".into()]
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }

    fn api_key_env(&self) -> &'static str {
        "TEST_API_KEY"
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.clone().unwrap_or_else(|| "scripted-model".into());
        self.requests.lock().unwrap().push(request);

        let content = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Other("script exhausted".into())))?;

        Ok(CompletionResponse {
            id: "scripted".into(),
            model,
            content,
            finish_reason: FinishReason::Stop,
            usage: Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
        })
    }
}
