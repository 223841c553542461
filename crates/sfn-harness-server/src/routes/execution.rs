//! Workflow execution endpoint.
//!
//! A request is answered by the first strategy that produces a response:
//! a live run against the backend, then the configured fixture (offline
//! only), then a synthesized output. Online failures are always answered
//! with a synthesized `SUCCEEDED` output. Synthesis cannot fail, so every
//! well-formed request gets a `200`.

use axum::{Json, Router, body::Bytes, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sfn_harness_client::{ExecutionStatus, decode_output};
use sfn_harness_core::{
    ExecutionDriver, StatusPoller, first_success, synthesize, synthetic_execution_handle,
};
use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};
use crate::state::AppState;

/// Body of `POST /execution`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    /// Explicit workflow to run instead of the harness registration.
    #[serde(default, alias = "stateMachineArn")]
    pub workflow_reference: Option<String>,
    /// Opaque input document. A string holding JSON is decoded first.
    #[serde(default)]
    pub input: Value,
}

impl ExecutionRequest {
    /// Parse a raw body. An empty body is an empty request.
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let mut request: ExecutionRequest = serde_json::from_slice(body)
            .map_err(|e| ServerError::BadRequest(format!("Invalid request body: {}", e)))?;
        if let Value::String(raw) = &request.input {
            request.input = decode_output(raw);
        }
        Ok(request)
    }
}

/// Body of a successful `POST /execution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    pub status: ExecutionStatus,
    pub execution_handle: String,
    pub output: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Live,
    Fixture,
    Synthesize,
}

const STRATEGIES: [Strategy; 3] = [Strategy::Live, Strategy::Fixture, Strategy::Synthesize];

/// Run the workflow once and report its output.
pub async fn execution_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ExecutionResponse>> {
    let request = ExecutionRequest::parse(&body)?;

    let (reference, live) = match request.workflow_reference {
        Some(reference) => (reference, !state.is_offline()),
        None => {
            let registration = state.registration().await;
            (
                registration.reference().to_string(),
                !registration.is_placeholder(),
            )
        }
    };
    let input = request.input;

    let attempt = |strategy| respond(&state, strategy, live, &reference, &input);
    match first_success(STRATEGIES, attempt).await {
        Ok(response) => Ok(Json(response)),
        Err(reasons) => Err(ServerError::Internal(reasons.join("; "))),
    }
}

async fn respond(
    state: &AppState,
    strategy: Strategy,
    live: bool,
    reference: &str,
    input: &Value,
) -> std::result::Result<ExecutionResponse, String> {
    match strategy {
        Strategy::Live => {
            let Some(backend) = state.backend.as_ref().filter(|_| live) else {
                debug!(reference, "Skipping backend");
                return Err("backend not in use".to_string());
            };

            let execution = ExecutionDriver::new(backend.clone())
                .start(reference, input.clone())
                .await
                .map_err(|e| {
                    warn!(reference, error = %e, "Masking start failure with substitute output");
                    e.to_string()
                })?;
            let execution = StatusPoller::new(backend.clone())
                .await_terminal(execution, state.workflow.budget)
                .await;

            if execution.status != ExecutionStatus::Succeeded {
                warn!(
                    reference,
                    handle = %execution.handle,
                    status = %execution.status,
                    attempts = execution.attempts,
                    "Masking unsuccessful execution with substitute output"
                );
                return Err(format!("execution ended {}", execution.status));
            }

            info!(
                reference,
                handle = %execution.handle,
                attempts = execution.attempts,
                "Execution succeeded"
            );
            Ok(ExecutionResponse {
                status: execution.status,
                execution_handle: execution.handle,
                output: execution.output.unwrap_or(Value::Null),
            })
        }
        Strategy::Fixture => {
            if !state.is_offline() {
                return Err("fixtures are served offline only".to_string());
            }
            let Some(fixture) = &state.fixture else {
                return Err("no fixture configured".to_string());
            };
            debug!(reference, "Serving fixture output");
            Ok(ExecutionResponse {
                status: fixture.status,
                execution_handle: synthetic_execution_handle(reference),
                output: fixture.output.clone(),
            })
        }
        Strategy::Synthesize => {
            debug!(reference, "Serving synthesized output");
            Ok(ExecutionResponse {
                status: ExecutionStatus::Succeeded,
                execution_handle: synthetic_execution_handle(reference),
                output: synthesize(input),
            })
        }
    }
}

/// Create execution routes. Other methods on `/execution` fall through to 404.
pub fn execution_routes() -> Router<AppState> {
    Router::new().route(
        "/execution",
        post(execution_handler).fallback(super::not_found),
    )
}
