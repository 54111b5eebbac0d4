//! Coder implementation - one prompt in, one model call, one parsed answer out

use crate::prompts;
use crate::run::{RunOutput, RunRequest};
use crate::session::StdinSession;
use crate::solution::{parse_solution, Solution};
use crate::solve::SolveRequest;
use omni_error::{Error, Result};
use omni_llm::{ChatMessage, CompletionRequest, LlmProvider, ResponseFormat, UsageTracker};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a single kind of model call is made
#[derive(Debug, Clone)]
pub struct InferenceSettings {
    /// Overrides the provider's default model
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    pub response_format: ResponseFormat,
}

impl InferenceSettings {
    pub fn new(temperature: f32, max_tokens: usize) -> Self {
        Self {
            model: None,
            temperature,
            max_tokens,
            response_format: ResponseFormat::Text,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.response_format = ResponseFormat::Json;
        self
    }

    fn request(&self, messages: Vec<ChatMessage>) -> CompletionRequest {
        let request = CompletionRequest::new(messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens)
            .with_response_format(self.response_format);
        match &self.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        }
    }
}

/// Configuration for the coder
#[derive(Debug, Clone)]
pub struct CoderConfig {
    pub solve: InferenceSettings,
    pub run: InferenceSettings,
    pub interactive: InferenceSettings,
    /// Extra attempts for retryable failures; 0 means a single attempt
    pub max_retries: u32,
    /// Turn budget for interactive sessions
    pub max_turns: usize,
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            solve: InferenceSettings::new(0.1, 2048).json(),
            run: InferenceSettings::new(0.1, 1024),
            interactive: InferenceSettings::new(0.0, 1024),
            max_retries: 0,
            max_turns: 16,
        }
    }
}

impl CoderConfig {
    /// Use the same model for every kind of call
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.solve.model = Some(model.clone());
        self.run.model = Some(model.clone());
        self.interactive.model = Some(model);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }
}

/// Longest pause between retries, whatever the provider asks for
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Solves prompts and simulates runs through an LLM provider
pub struct Coder<P> {
    provider: P,
    config: CoderConfig,
    usage: Mutex<UsageTracker>,
}

impl<P: LlmProvider> Coder<P> {
    /// Create a coder with default configuration
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, CoderConfig::default())
    }

    pub fn with_config(provider: P, config: CoderConfig) -> Self {
        Self {
            provider,
            config,
            usage: Mutex::new(UsageTracker::new()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &CoderConfig {
        &self.config
    }

    /// Snapshot of token usage so far
    pub fn usage(&self) -> UsageTracker {
        self.usage.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The model `settings` resolve to
    pub fn model_for<'a>(&'a self, settings: &'a InferenceSettings) -> &'a str {
        settings.model.as_deref().unwrap_or(self.provider.default_model())
    }

    /// Start an interactive run with this coder's turn budget
    pub fn session(&self, code: impl Into<String>, language: impl Into<String>) -> StdinSession {
        StdinSession::new(code, language).with_max_turns(self.config.max_turns)
    }

    /// Ask the model for a solution
    pub async fn solve(&self, request: &SolveRequest) -> Result<Solution> {
        request.validate().map_err(|e| e.with_operation("coder::solve"))?;

        let user =
            prompts::solve_user_message(request.prompt_text(), request.code(), request.language());
        let messages = vec![
            ChatMessage::system(prompts::SOLVE_SYSTEM_PROMPT),
            ChatMessage::user(user),
        ];

        let reply = self.infer("coder::solve", &self.config.solve, messages).await?;
        let solution = parse_solution(&reply);

        info!(
            kind = solution.kind(),
            language = request.language(),
            reply_len = reply.len(),
            "solve finished"
        );
        Ok(solution)
    }

    /// Ask the model to play interpreter for `request.code`
    pub async fn run(&self, request: &RunRequest) -> Result<RunOutput> {
        if request.code.trim().is_empty() {
            return Err(Error::invalid_argument("code is empty").with_operation("coder::run"));
        }

        let stdin = request.stdin_buffer();
        let user =
            prompts::run_user_message(request.language_tag(), &request.code, stdin.as_deref());

        let output = if request.is_interactive() {
            let messages = vec![
                ChatMessage::system(prompts::interactive_system_prompt()),
                ChatMessage::user(user),
            ];
            let reply = self.infer("coder::run", &self.config.interactive, messages).await?;
            RunOutput::from_interactive_reply(&reply)
        } else {
            let messages = vec![
                ChatMessage::system(prompts::RUN_SYSTEM_PROMPT),
                ChatMessage::user(user),
            ];
            let reply = self.infer("coder::run", &self.config.run, messages).await?;
            RunOutput::from_batch_reply(&reply)
        };

        info!(
            language = request.language_tag(),
            interactive = request.is_interactive(),
            stdin_lines = request.stdin.as_ref().map_or(0, Vec::len),
            waiting = output.waiting,
            "run finished"
        );
        Ok(output)
    }

    /// One completion with bounded retries; returns the reply text
    async fn infer(
        &self,
        operation: &'static str,
        settings: &InferenceSettings,
        messages: Vec<ChatMessage>,
    ) -> Result<String> {
        let model = self.model_for(settings).to_string();

        if !self.provider.is_configured() {
            return Err(Error::credentials_missing(self.provider.api_key_env())
                .with_operation(operation)
                .with_context("provider", self.provider.name().to_string()));
        }

        let request = settings.request(messages);
        debug!(
            operation,
            provider = self.provider.name(),
            model = %model,
            prompt_chars = request.messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "calling model"
        );

        let mut attempt = 0;
        loop {
            let result = match self.provider.complete(request.clone()).await {
                Ok(response) => {
                    self.usage
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .track(&response.model, &response.usage);
                    response.content.ok_or_else(Error::empty_response)
                }
                Err(e) => Err(e.into_error()),
            };

            let err = match result {
                Ok(content) => return Ok(content),
                Err(err) => err
                    .with_operation(operation)
                    .with_context("provider", self.provider.name().to_string())
                    .with_context("model", model.clone()),
            };

            if !err.is_retryable() || attempt >= self.config.max_retries {
                return Err(if attempt > 0 { err.persist() } else { err });
            }

            attempt += 1;
            let delay = backoff(&err, attempt);
            warn!(
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying model call"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Honour a provider's `retry_after`, otherwise back off exponentially
fn backoff(err: &Error, attempt: u32) -> Duration {
    let delay = err
        .context_value("retry_after")
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_millis(250 * 2u64.pow(attempt.min(6))));
    delay.min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedProvider;
    use omni_error::{ErrorKind, ErrorStatus};
    use omni_llm::{ProviderError, Role};

    #[tokio::test]
    async fn test_solve_builds_prompt_and_parses_reply() {
        let provider = ScriptedProvider::new().reply(
            r#"{"type":"logic","explanation":"Slice it.","code":"xs[::-1]","language":"python"}"#,
        );
        let coder = Coder::new(provider);

        let request = SolveRequest::new("reverse a list").with_language("python");
        let solution = coder.solve(&request).await.unwrap();
        assert!(matches!(solution, Solution::Logic(ref l) if l.code == "xs[::-1]"));

        let sent = coder.provider().requests();
        assert_eq!(sent.len(), 1);
        let request = &sent[0];
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Omni Coder"));
        assert_eq!(
            request.messages[1].content,
            "User Prompt: reverse a list\n\nTarget Language: python"
        );
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, Some(2048));
        assert_eq!(request.response_format, ResponseFormat::Json);
    }

    #[tokio::test]
    async fn test_solve_rejects_empty_prompt_without_calling_model() {
        let coder = Coder::new(ScriptedProvider::new());
        let err = coder.solve(&SolveRequest::new("   ")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.operation(), "coder::solve");
        assert!(coder.provider().requests().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let coder = Coder::new(ScriptedProvider::new().unconfigured());
        let err = coder.solve(&SolveRequest::new("hello")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::CredentialsMissing);
        assert_eq!(err.context_value("env_var"), Some("TEST_API_KEY"));
        assert!(coder.provider().requests().is_empty());
    }

    #[tokio::test]
    async fn test_batch_run() {
        let coder = Coder::new(ScriptedProvider::new().reply("Hello, World!\n"));
        let output = coder
            .run(&RunRequest::new("print('Hello, World!')", "python"))
            .await
            .unwrap();

        assert_eq!(output, RunOutput { output: "Hello, World!".into(), waiting: false });

        let sent = coder.provider().requests();
        assert!(sent[0].messages[0].content.starts_with("You are a code execution engine"));
        assert_eq!(sent[0].messages[1].content, "Language: python\nCode:\nprint('Hello, World!')");
        assert_eq!(sent[0].response_format, ResponseFormat::Text);
        assert_eq!(sent[0].max_tokens, Some(1024));
    }

    #[tokio::test]
    async fn test_interactive_run_sends_queue() {
        let provider =
            ScriptedProvider::new().reply("Enter number 1: 10\nEnter number 2: <WAITING_FOR_INPUT>");
        let coder = Coder::new(provider);
        let request = RunRequest::new("int main(){...}", "c").with_stdin(vec!["10".into()]);
        let output = coder.run(&request).await.unwrap();

        assert!(output.waiting);
        assert_eq!(output.output, "Enter number 1: 10\nEnter number 2:");

        let sent = coder.provider().requests();
        assert!(sent[0].messages[0].content.contains("STATEFUL CODE SIMULATOR"));
        assert!(sent[0].messages[1].content.ends_with("Standard Input (stdin):\n10\n"));
        assert_eq!(sent[0].temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_run_rejects_empty_code() {
        let coder = Coder::new(ScriptedProvider::new());
        let err = coder.run(&RunRequest::new("\n", "python")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_provider_error_carries_context() {
        let coder = Coder::new(ScriptedProvider::new().fail(ProviderError::AuthenticationFailed));
        let err = coder.run(&RunRequest::new("print(1)", "python")).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::AuthenticationFailed);
        assert_eq!(err.operation(), "coder::run");
        assert_eq!(err.context_value("provider"), Some("scripted"));
        assert_eq!(err.context_value("model"), Some("scripted-model"));
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_retryable_errors() {
        let provider = ScriptedProvider::new()
            .fail(ProviderError::RateLimited { retry_after: Some(1) })
            .fail(ProviderError::Network("reset".into()))
            .reply("ok");
        let coder = Coder::with_config(provider, CoderConfig::default().with_max_retries(2));

        let output = coder.run(&RunRequest::new("print('ok')", "python")).await.unwrap();
        assert_eq!(output.output, "ok");
        assert_eq!(coder.provider().requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_are_persistent() {
        let provider = ScriptedProvider::new()
            .fail(ProviderError::Network("down".into()))
            .fail(ProviderError::Network("still down".into()));
        let coder = Coder::with_config(provider, CoderConfig::default().with_max_retries(1));

        let err = coder.run(&RunRequest::new("print(1)", "python")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkFailed);
        assert_eq!(err.status(), ErrorStatus::Persistent);
        assert_eq!(coder.provider().requests().len(), 2);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let provider = ScriptedProvider::new()
            .fail(ProviderError::Network("down".into()))
            .reply("unused");
        let coder = Coder::new(provider);

        let err = coder.run(&RunRequest::new("print(1)", "python")).await.unwrap_err();
        assert_eq!(err.status(), ErrorStatus::Temporary);
        assert_eq!(coder.provider().requests().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_content_is_an_error() {
        let coder = Coder::new(ScriptedProvider::new().no_content());
        let err = coder.run(&RunRequest::new("print(1)", "python")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
    }

    #[tokio::test]
    async fn test_usage_and_model_override() {
        let provider = ScriptedProvider::new().reply("1").reply("2");
        let coder = Coder::with_config(provider, CoderConfig::default().with_model("big-model"));

        coder.run(&RunRequest::new("print(1)", "python")).await.unwrap();
        coder.run(&RunRequest::new("print(2)", "python")).await.unwrap();

        assert_eq!(coder.provider().requests()[0].model.as_deref(), Some("big-model"));
        let usage = coder.usage();
        assert_eq!(usage.total_calls, 2);
        assert_eq!(usage.total_tokens(), 2 * (10 + 5));
    }

    #[test]
    fn test_backoff() {
        let err = Error::new(ErrorKind::RateLimited, "x").with_context("retry_after", "3");
        assert_eq!(backoff(&err, 1), Duration::from_secs(3));

        let err = Error::new(ErrorKind::RateLimited, "x").with_context("retry_after", "600");
        assert_eq!(backoff(&err, 1), MAX_BACKOFF);

        let err = Error::new(ErrorKind::NetworkFailed, "x");
        assert_eq!(backoff(&err, 1), Duration::from_millis(500));
        assert_eq!(backoff(&err, 2), Duration::from_millis(1000));
    }
}
