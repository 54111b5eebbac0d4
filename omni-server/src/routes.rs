//! Request handlers.
//!
//! Failures are answered in the same body shape as successes so clients
//! can always render the response.

use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use omni_coder::{RunOutput, RunRequest, Solution, SolveRequest, RUN_LANGUAGES, SOLVE_LANGUAGES};
use omni_error::{Error, ErrorKind};
use omni_llm::{AnyProvider, LlmProvider, UsageTracker};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

pub async fn solve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SolveRequest>,
) -> (StatusCode, Json<Solution>) {
    match state.coder.solve(&request).await {
        Ok(solution) => (StatusCode::OK, Json(solution)),
        Err(err) => {
            log_failure(&err);
            solve_failure(&err, state.coder.provider())
        }
    }
}

pub(crate) fn solve_failure(err: &Error, provider: &AnyProvider) -> (StatusCode, Json<Solution>) {
    let (status, message) = match err.kind() {
        ErrorKind::CredentialsMissing => (
            StatusCode::OK,
            format!("**Error**: {} is missing in .env.local", missing_var(err, provider)),
        ),
        ErrorKind::InvalidArgument => {
            (StatusCode::BAD_REQUEST, format!("**Error**: {}", err.message()))
        }
        _ => (
            StatusCode::OK,
            format!(
                "**{} API Error**: {}\n\nPlease check your API key and connection.",
                provider.provider_type().display_name(),
                err.message()
            ),
        ),
    };
    (status, Json(Solution::logic_error(message)))
}

pub async fn run(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RunRequest>,
) -> (StatusCode, Json<RunOutput>) {
    match state.coder.run(&request).await {
        Ok(output) => (StatusCode::OK, Json(output)),
        Err(err) => {
            log_failure(&err);
            run_failure(&err, state.coder.provider())
        }
    }
}

pub(crate) fn run_failure(err: &Error, provider: &AnyProvider) -> (StatusCode, Json<RunOutput>) {
    let (status, output) = match err.kind() {
        ErrorKind::CredentialsMissing => {
            (StatusCode::OK, format!("Error: {} is missing.", missing_var(err, provider)))
        }
        ErrorKind::InvalidArgument => {
            (StatusCode::BAD_REQUEST, format!("Error: {}", err.message()))
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {}", err.message())),
    };
    (status, Json(RunOutput { output, waiting: false }))
}

fn missing_var<'a>(err: &'a Error, provider: &AnyProvider) -> &'a str {
    err.context_value("env_var").unwrap_or(provider.api_key_env())
}

fn log_failure(err: &Error) {
    match err.kind() {
        ErrorKind::InvalidArgument | ErrorKind::CredentialsMissing => {
            warn!(error = %err, "request rejected")
        }
        _ => error!(error = %err, "request failed"),
    }
}

pub async fn languages() -> Json<serde_json::Value> {
    Json(json!({
        "solve": SOLVE_LANGUAGES,
        "run": RUN_LANGUAGES,
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
    pub model: String,
    pub configured: bool,
    pub uptime_secs: u64,
    pub usage: UsageTracker,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let coder = &state.coder;
    Json(HealthResponse {
        status: "ok",
        provider: coder.provider().name().to_string(),
        model: coder.model_for(&coder.config().solve).to_string(),
        configured: coder.provider().is_configured(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        usage: coder.usage(),
    })
}
