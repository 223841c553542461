//! Harness data model.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use sfn_harness_client::ExecutionStatus;

/// A workflow definition the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredWorkflow {
    /// Opaque handle returned by registration.
    pub reference: String,
    /// Role candidate that was accepted, `None` for the no-role fallback.
    pub used_role: Option<String>,
}

/// One execution of a registered workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub handle: String,
    pub input: Value,
    pub status: ExecutionStatus,
    /// Present only in terminal states other than TIMED_OUT.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    /// Status queries made so far.
    pub attempts: u32,
}

impl Execution {
    /// A freshly started execution.
    pub fn started(handle: impl Into<String>, input: Value) -> Self {
        Self {
            handle: handle.into(),
            input,
            status: ExecutionStatus::Running,
            output: None,
            attempts: 0,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == ExecutionStatus::Succeeded
    }
}

/// Fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    /// Wait before each status query.
    pub interval: Duration,
    /// Maximum number of status queries.
    pub max_attempts: u32,
}

impl RetryBudget {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }
}

impl Default for RetryBudget {
    /// One query per second for thirty seconds.
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 30)
    }
}
