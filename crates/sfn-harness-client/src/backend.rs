//! The workflow service seam.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::types::{CreateWorkflow, ExecutionDescription, WorkflowSummary};

/// Operations the harness needs from a workflow execution service.
///
/// Everything is opaque: definitions are documents, executions are handles.
/// Implementations must be cheap to share across concurrent requests.
#[async_trait]
pub trait WorkflowBackend: Send + Sync {
    /// List all registered workflow definitions.
    async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>>;

    /// Delete a registered definition by reference.
    async fn delete_workflow(&self, reference: &str) -> Result<()>;

    /// Register a definition and return its reference.
    async fn create_workflow(&self, request: &CreateWorkflow) -> Result<String>;

    /// Start an execution and return its handle.
    async fn start_execution(&self, reference: &str, input: &Value) -> Result<String>;

    /// Read an execution's current status and output.
    async fn describe_execution(&self, handle: &str) -> Result<ExecutionDescription>;

    /// Name of this backend, for logs.
    fn name(&self) -> &str;

    /// Network endpoint, for backends reached over HTTP.
    fn endpoint_url(&self) -> Option<&Url> {
        None
    }
}

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn WorkflowBackend>;
