//! Backend-neutral request/response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A registered workflow definition as reported by the service listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowSummary {
    /// Opaque reference (state machine ARN).
    pub reference: String,
    /// Definition name.
    pub name: String,
}

/// Parameters for registering a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorkflow {
    pub name: String,
    /// Resolved definition document.
    pub definition: String,
    /// Permission role; `None` registers without one.
    pub role: Option<String>,
}

/// Execution status as seen by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

impl ExecutionStatus {
    /// Map a status string reported by the service.
    ///
    /// `ABORTED` counts as a failure; anything unrecognized (including
    /// `PENDING_REDRIVE`) is treated as still running.
    pub fn from_backend(status: &str) -> Self {
        match status {
            "SUCCEEDED" => ExecutionStatus::Succeeded,
            "FAILED" | "ABORTED" => ExecutionStatus::Failed,
            "TIMED_OUT" => ExecutionStatus::TimedOut,
            _ => ExecutionStatus::Running,
        }
    }

    /// No further state change occurs after a terminal status.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ExecutionStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Succeeded => "SUCCEEDED",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::TimedOut => "TIMED_OUT",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of an execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionDescription {
    pub status: ExecutionStatus,
    /// Output document, when the service reports one.
    pub output: Option<Value>,
}

/// Decode an output document the service delivers as a JSON string.
///
/// Strings that are not valid JSON are kept verbatim.
pub fn decode_output(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
