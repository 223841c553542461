//! HTTP client for Step Functions (Local).
//!
//! Speaks the AWS JSON 1.0 protocol: every operation is a `POST /` with the
//! operation named in `X-Amz-Target` and a JSON body.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::backend::WorkflowBackend;
use crate::error::{BackendError, ErrorResponse, Result};
use crate::types::{
    CreateWorkflow, ExecutionDescription, ExecutionStatus, WorkflowSummary, decode_output,
};

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_REGION: &str = "us-east-1";

/// Content type of the AWS JSON 1.0 protocol.
const AMZ_JSON: &str = "application/x-amz-json-1.0";

/// Target prefix for Step Functions operations.
const TARGET_PREFIX: &str = "AWSStepFunctions";

/// Placeholder access key. Step Functions Local does not verify signatures.
const LOCAL_ACCESS_KEY: &str = "dummy";

/// Step Functions API client.
#[derive(Clone)]
pub struct StepFunctionsClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    endpoint: Url,
    region: String,
    timeout: Duration,
}

impl StepFunctionsClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client for Step Functions Local on its default port.
    pub fn localhost() -> Result<Self> {
        Self::builder().endpoint("http://localhost:8083").build()
    }

    /// Get the endpoint URL.
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Invoke one operation and decode its response.
    async fn call<I, O>(&self, operation: &str, input: &I) -> Result<O>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        let body = serde_json::to_vec(input)?;
        debug!(operation, endpoint = %self.inner.endpoint, "Calling workflow service");

        let response = self
            .inner
            .http
            .post(self.inner.endpoint.clone())
            .header("X-Amz-Target", format!("{}.{}", TARGET_PREFIX, operation))
            .header("X-Amz-Date", Utc::now().format("%Y%m%dT%H%M%SZ").to_string())
            .header(AUTHORIZATION, credential_header(&self.inner.region, Utc::now()))
            .body(body)
            .timeout(self.inner.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(extract_error(response).await);
        }

        let bytes = response.bytes().await?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            // Some operations answer with an empty body.
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl WorkflowBackend for StepFunctionsClient {
    async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>> {
        let mut workflows = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page: ListStateMachinesOutput = self
                .call(
                    "ListStateMachines",
                    &ListStateMachinesInput {
                        next_token: next_token.take(),
                    },
                )
                .await?;

            workflows.extend(page.state_machines.into_iter().map(|m| WorkflowSummary {
                reference: m.state_machine_arn,
                name: m.name,
            }));

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(workflows)
    }

    async fn delete_workflow(&self, reference: &str) -> Result<()> {
        let _: Value = self
            .call(
                "DeleteStateMachine",
                &StateMachineRef {
                    state_machine_arn: reference,
                },
            )
            .await?;
        Ok(())
    }

    async fn create_workflow(&self, request: &CreateWorkflow) -> Result<String> {
        let output: CreateStateMachineOutput = self
            .call(
                "CreateStateMachine",
                &CreateStateMachineInput {
                    name: &request.name,
                    definition: &request.definition,
                    role_arn: request.role.as_deref(),
                },
            )
            .await?;
        Ok(output.state_machine_arn)
    }

    async fn start_execution(&self, reference: &str, input: &Value) -> Result<String> {
        let output: StartExecutionOutput = self
            .call(
                "StartExecution",
                &StartExecutionInput {
                    state_machine_arn: reference,
                    input: serde_json::to_string(input)?,
                },
            )
            .await?;
        Ok(output.execution_arn)
    }

    async fn describe_execution(&self, handle: &str) -> Result<ExecutionDescription> {
        let output: DescribeExecutionOutput = self
            .call(
                "DescribeExecution",
                &ExecutionRef {
                    execution_arn: handle,
                },
            )
            .await?;
        Ok(ExecutionDescription {
            status: ExecutionStatus::from_backend(&output.status),
            output: output.output.as_deref().map(decode_output),
        })
    }

    fn name(&self) -> &str {
        "stepfunctions"
    }

    fn endpoint_url(&self) -> Option<&Url> {
        Some(&self.inner.endpoint)
    }
}

/// Extract an error from a failed response.
async fn extract_error(response: reqwest::Response) -> BackendError {
    let status = response.status().as_u16();

    match response.json::<ErrorResponse>().await {
        Ok(err) => BackendError::Api {
            status,
            code: err
                .code
                .map(|c| c.rsplit('#').next().unwrap_or_default().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            message: err.message.unwrap_or_else(|| format!("HTTP {}", status)),
        },
        Err(_) => BackendError::Api {
            status,
            code: "unknown".to_string(),
            message: format!("HTTP {}", status),
        },
    }
}

/// SigV4-shaped authorization header with placeholder credentials.
///
/// Only the credential scope is meaningful to the local emulator.
fn credential_header(region: &str, now: DateTime<Utc>) -> String {
    format!(
        "AWS4-HMAC-SHA256 Credential={}/{}/{}/states/aws4_request, \
         SignedHeaders=content-type;host;x-amz-date;x-amz-target, Signature=0",
        LOCAL_ACCESS_KEY,
        now.format("%Y%m%d"),
        region
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListStateMachinesInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListStateMachinesOutput {
    #[serde(default)]
    state_machines: Vec<StateMachineListItem>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateMachineListItem {
    state_machine_arn: String,
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateMachineRef<'a> {
    state_machine_arn: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateStateMachineInput<'a> {
    name: &'a str,
    definition: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_arn: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStateMachineOutput {
    state_machine_arn: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StartExecutionInput<'a> {
    state_machine_arn: &'a str,
    input: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartExecutionOutput {
    execution_arn: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecutionRef<'a> {
    execution_arn: &'a str,
}

#[derive(Deserialize)]
struct DescribeExecutionOutput {
    status: String,
    #[serde(default)]
    output: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating a StepFunctionsClient.
#[derive(Debug)]
pub struct ClientBuilder {
    endpoint: Option<String>,
    region: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_REGION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
        }
    }

    /// Set the service endpoint.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Set the region used in the credential scope.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<StepFunctionsClient> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| BackendError::Config("endpoint is required".to_string()))?;

        let mut endpoint = Url::parse(&endpoint)?;
        if !endpoint.path().ends_with('/') {
            endpoint.set_path(&format!("{}/", endpoint.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(AMZ_JSON));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("sfn-harness/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        Ok(StepFunctionsClient {
            inner: Arc::new(ClientInner {
                http,
                endpoint,
                region: self.region,
                timeout: self.timeout,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
