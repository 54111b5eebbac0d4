//! # omni-server
//!
//! HTTP API for Omni Coder.
//!
//! Endpoints:
//! - `POST /api/solve` - generate a web or logic solution
//! - `POST /api/run` - simulate a program run (batch, or interactive with a stdin queue)
//! - `GET /api/languages` - language catalogues
//! - `GET /health` - backend, model, key status, uptime and token usage

pub mod config;
pub mod routes;

pub use config::{load_dotenv, ListenArgs, LlmArgs, ServerConfig, DEFAULT_BODY_LIMIT};

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use omni_coder::Coder;
use omni_llm::{AnyProvider, LlmProvider};
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared state for all handlers
pub struct AppState {
    pub coder: Coder<AnyProvider>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(coder: Coder<AnyProvider>) -> Self {
        Self {
            coder,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: Arc<AppState>, body_limit: usize) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/solve", post(routes::solve))
        .route("/api/run", post(routes::run))
        .route("/api/languages", get(routes::languages))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(body_limit))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Build the coder from `config` and serve until Ctrl-C
pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let coder = config.llm.build_coder().context("invalid provider configuration")?;
    let provider = coder.provider();

    info!(
        provider = provider.name(),
        model = coder.model_for(&coder.config().solve),
        max_retries = coder.config().max_retries,
        "model backend ready"
    );
    if !provider.is_configured() {
        warn!(
            env_var = provider.api_key_env(),
            "no API key set; requests will be answered with a missing-key message"
        );
    }

    let app = router(Arc::new(AppState::new(coder)), config.listen.body_limit);

    let addr = config.listen.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(addr = %addr, "Omni Coder API listening");
    info!("  POST /api/solve      - generate a solution");
    info!("  POST /api/run        - simulate a program run");
    info!("  GET  /api/languages  - language catalogues");
    info!("  GET  /health         - health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use httpmock::prelude::*;
    use omni_coder::CoderConfig;
    use omni_llm::ProviderConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_for(mut config: ProviderConfig) -> Router {
        config.timeout_secs = Some(5);
        let provider = AnyProvider::from_config(config).unwrap();
        let coder = Coder::with_config(provider, CoderConfig::default());
        router(Arc::new(AppState::new(coder)), DEFAULT_BODY_LIMIT)
    }

    fn groq_app(base_url: &str, api_key: Option<&str>) -> Router {
        app_for(ProviderConfig::groq(api_key.map(str::to_string)).with_base_url(base_url))
    }

    fn groq_reply(content: &str) -> Value {
        json!({
            "id": "chatcmpl-1",
            "model": "llama-3.3-70b-versatile",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 40, "completion_tokens": 20, "total_tokens": 60 }
        })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, request).await
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_solve_returns_parsed_solution() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .json_body_partial(r#"{ "response_format": { "type": "json_object" } }"#);
                then.status(200).json_body(groq_reply(
                    "```json\n{\"type\":\"web\",\"html\":\"<button>+1</button>\",\"css\":\"\",\"js\":\"let n = 0;\"}\n```",
                ));
            })
            .await;

        let app = groq_app(&server.base_url(), Some("gsk-test"));
        let (status, body) =
            post_json(app, "/api/solve", json!({ "prompt": "a counter", "language": "web" })).await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "web");
        assert_eq!(body["html"], "<button>+1</button>");
        assert_eq!(body["js"], "let n = 0;");
    }

    #[tokio::test]
    async fn test_solve_without_key() {
        let app = groq_app("http://127.0.0.1:9", None);
        let (status, body) = post_json(app, "/api/solve", json!({ "problem": "two sum" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "type": "logic",
                "explanation": "**Error**: GROQ_API_KEY is missing in .env.local",
                "code": "",
                "language": "text"
            })
        );
    }

    #[tokio::test]
    async fn test_solve_empty_prompt_is_bad_request() {
        let app = groq_app("http://127.0.0.1:9", Some("gsk-test"));
        let (status, body) = post_json(app, "/api/solve", json!({ "prompt": "" })).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["explanation"], "**Error**: prompt is empty");
    }

    #[tokio::test]
    async fn test_solve_provider_failure_is_still_a_solution() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(401).body("invalid api key");
            })
            .await;

        let app = groq_app(&server.base_url(), Some("gsk-bad"));
        let (status, body) = post_json(app, "/api/solve", json!({ "prompt": "fizzbuzz" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "logic");
        let explanation = body["explanation"].as_str().unwrap();
        assert!(explanation.starts_with("**Groq API Error**: Authentication failed"));
        assert!(explanation.ends_with("\n\nPlease check your API key and connection."));
    }

    #[tokio::test]
    async fn test_solve_failure_names_gemini() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/models/gemini-flash-latest:generateContent")
                    .header("x-goog-api-key", "AIza-bad");
                then.status(400).body(
                    r#"{"error":{"status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#,
                );
            })
            .await;

        let config =
            ProviderConfig::gemini(Some("AIza-bad".into())).with_base_url(server.base_url());
        let (status, body) =
            post_json(app_for(config), "/api/solve", json!({ "prompt": "fizzbuzz" })).await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "logic");
        let explanation = body["explanation"].as_str().unwrap();
        assert!(explanation.starts_with("**Gemini API Error**: Authentication failed"));
        assert!(explanation.ends_with("\n\nPlease check your API key and connection."));
    }

    #[tokio::test]
    async fn test_interactive_run() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_contains("Standard Input (stdin):\\n10\\n");
                then.status(200).json_body(groq_reply(
                    "Enter number 1: 10\nEnter number 2: <WAITING_FOR_INPUT>",
                ));
            })
            .await;

        let app = groq_app(&server.base_url(), Some("gsk-test"));
        let (status, body) = post_json(
            app,
            "/api/run",
            json!({ "code": "int main(){...}", "language": "c", "stdin": ["10"] }),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "output": "Enter number 1: 10\nEnter number 2:", "waiting": true })
        );
    }

    #[tokio::test]
    async fn test_run_errors() {
        let app = groq_app("http://127.0.0.1:9", None);
        let (status, body) =
            post_json(app, "/api/run", json!({ "code": "print(1)", "language": "python" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "output": "Error: GROQ_API_KEY is missing.", "waiting": false }));

        let app = groq_app("http://127.0.0.1:9", Some("gsk-test"));
        let (status, body) =
            post_json(app, "/api/run", json!({ "code": "", "language": "python" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["output"], "Error: code is empty");

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(503).body("over capacity");
            })
            .await;
        let app = groq_app(&server.base_url(), Some("gsk-test"));
        let (status, body) =
            post_json(app, "/api/run", json!({ "code": "print(1)", "language": "python" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["output"], "Error: API error (503): over capacity");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let app = groq_app("http://127.0.0.1:9", Some("gsk-test"));
        let request = Request::builder()
            .method("POST")
            .uri("/api/run")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_languages_and_health() {
        let app = groq_app("http://127.0.0.1:9", None);

        let request = Request::builder().uri("/api/languages").body(Body::empty()).unwrap();
        let (status, body) = send(app.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["solve"][0], json!({ "id": "auto", "name": "Auto Detect" }));
        assert_eq!(body["run"].as_array().unwrap().len(), 6);

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["provider"], "groq");
        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["configured"], false);
        assert_eq!(body["usage"]["total_calls"], 0);
    }

    #[tokio::test]
    async fn test_body_limit() {
        let app = groq_app("http://127.0.0.1:9", Some("gsk-test"));
        let code = "x".repeat(DEFAULT_BODY_LIMIT + 1);
        let body = json!({ "code": code, "language": "python" }).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/api/run")
            .header("content-type", "application/json")
            .header("content-length", body.len())
            .body(Body::from(body))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
