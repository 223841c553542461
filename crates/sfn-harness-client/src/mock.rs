//! In-memory backend for tests.
//!
//! Behaves like a small Step Functions: created workflows show up in
//! listings, deletions remove them, executions run against a status script.
//! Every call is recorded so tests can assert on exact call sequences.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::time::Instant;

use crate::backend::WorkflowBackend;
use crate::error::{BackendError, Result};
use crate::types::{CreateWorkflow, ExecutionDescription, ExecutionStatus, WorkflowSummary};

/// A recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    List,
    Delete(String),
    Create { name: String, role: Option<String> },
    Start { reference: String, input: Value },
    Describe(String),
}

/// Which registration attempts the mock accepts.
#[derive(Debug, Clone)]
pub enum CreatePolicy {
    AcceptAny,
    /// Accept only these roles; `None` in the list accepts the no-role attempt.
    AcceptOnly(Vec<Option<String>>),
    RejectAll,
}

/// One scripted answer to a status query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockStatus {
    Status(ExecutionStatus),
    /// The query itself fails.
    Error,
}

type OutputFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

struct MockState {
    workflows: Vec<WorkflowSummary>,
    executions: HashMap<String, Value>,
    calls: Vec<BackendCall>,
    describe_times: Vec<Instant>,
    describe_count: usize,
}

/// A scripted backend for testing purposes.
pub struct MockBackend {
    state: Mutex<MockState>,
    fail_list: bool,
    fail_delete: bool,
    fail_start: bool,
    create_policy: CreatePolicy,
    statuses: Vec<MockStatus>,
    output: OutputFn,
}

impl std::fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockBackend")
            .field("create_policy", &self.create_policy)
            .field("statuses", &self.statuses)
            .finish_non_exhaustive()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// A healthy backend: accepts any registration, executions succeed on
    /// the first status query and echo their input as output.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                workflows: Vec::new(),
                executions: HashMap::new(),
                calls: Vec::new(),
                describe_times: Vec::new(),
                describe_count: 0,
            }),
            fail_list: false,
            fail_delete: false,
            fail_start: false,
            create_policy: CreatePolicy::AcceptAny,
            statuses: vec![MockStatus::Status(ExecutionStatus::Succeeded)],
            output: Arc::new(|input| input.clone()),
        }
    }

    /// Seed workflows that already exist before the run.
    pub fn with_existing(self, workflows: Vec<WorkflowSummary>) -> Self {
        self.state.lock().workflows = workflows;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn with_create_policy(mut self, policy: CreatePolicy) -> Self {
        self.create_policy = policy;
        self
    }

    /// Script the answers to successive status queries.
    ///
    /// Queries past the end of the script repeat the last entry.
    pub fn with_statuses(mut self, statuses: Vec<MockStatus>) -> Self {
        self.statuses = statuses;
        self
    }

    /// Compute the output of a successful execution from its input.
    pub fn with_output<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.output = Arc::new(f);
        self
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Roles of every registration attempt, in order.
    pub fn create_attempts(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::Create { role, .. } => Some(role),
                _ => None,
            })
            .collect()
    }

    pub fn start_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Start { .. }))
    }

    pub fn describe_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Describe(_)))
    }

    /// When each status query happened.
    pub fn describe_times(&self) -> Vec<Instant> {
        self.state.lock().describe_times.clone()
    }

    /// Currently registered workflows.
    pub fn workflows(&self) -> Vec<WorkflowSummary> {
        self.state.lock().workflows.clone()
    }

    fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn accepts(&self, role: &Option<String>) -> bool {
        match &self.create_policy {
            CreatePolicy::AcceptAny => true,
            CreatePolicy::AcceptOnly(roles) => roles.contains(role),
            CreatePolicy::RejectAll => false,
        }
    }
}

#[async_trait]
impl WorkflowBackend for MockBackend {
    async fn list_workflows(&self) -> Result<Vec<WorkflowSummary>> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::List);
        if self.fail_list {
            return Err(BackendError::api(500, "ServiceUnavailable", "listing failed"));
        }
        Ok(state.workflows.clone())
    }

    async fn delete_workflow(&self, reference: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Delete(reference.to_string()));
        if self.fail_delete {
            return Err(BackendError::api(500, "ServiceUnavailable", "deletion failed"));
        }
        state.workflows.retain(|w| w.reference != reference);
        Ok(())
    }

    async fn create_workflow(&self, request: &CreateWorkflow) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Create {
            name: request.name.clone(),
            role: request.role.clone(),
        });

        if !self.accepts(&request.role) {
            return Err(BackendError::api(
                400,
                "InvalidArn",
                format!("role not accepted: {:?}", request.role),
            ));
        }
        if state.workflows.iter().any(|w| w.name == request.name) {
            return Err(BackendError::api(
                400,
                "StateMachineAlreadyExists",
                format!("State Machine Already Exists: '{}'", request.name),
            ));
        }

        let reference = format!(
            "arn:aws:states:us-east-1:123456789012:stateMachine:{}",
            request.name
        );
        state.workflows.push(WorkflowSummary {
            reference: reference.clone(),
            name: request.name.clone(),
        });
        Ok(reference)
    }

    async fn start_execution(&self, reference: &str, input: &Value) -> Result<String> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Start {
            reference: reference.to_string(),
            input: input.clone(),
        });

        if self.fail_start {
            return Err(BackendError::api(400, "InvalidArn", "start rejected"));
        }
        if !state.workflows.iter().any(|w| w.reference == reference) {
            return Err(BackendError::api(
                400,
                "StateMachineDoesNotExist",
                format!("State Machine Does Not Exist: '{}'", reference),
            ));
        }

        let name = reference.rsplit(':').next().unwrap_or("workflow");
        let handle = format!(
            "arn:aws:states:us-east-1:123456789012:execution:{}:{}",
            name,
            uuid::Uuid::new_v4()
        );
        state.executions.insert(handle.clone(), input.clone());
        Ok(handle)
    }

    async fn describe_execution(&self, handle: &str) -> Result<ExecutionDescription> {
        let mut state = self.state.lock();
        state.calls.push(BackendCall::Describe(handle.to_string()));
        state.describe_times.push(Instant::now());

        let index = state.describe_count.min(self.statuses.len().saturating_sub(1));
        state.describe_count += 1;

        let step = self
            .statuses
            .get(index)
            .copied()
            .unwrap_or(MockStatus::Status(ExecutionStatus::Succeeded));

        match step {
            MockStatus::Error => Err(BackendError::api(500, "InternalFailure", "describe failed")),
            MockStatus::Status(status) => {
                let output = match status {
                    ExecutionStatus::Succeeded => state.executions.get(handle).map(|i| (self.output)(i)),
                    _ => None,
                };
                Ok(ExecutionDescription { status, output })
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
