//! Bounded status polling.

use sfn_harness_client::{ExecutionStatus, SharedBackend};
use tracing::{debug, info, warn};

use crate::model::{Execution, RetryBudget};

/// Polls an execution until it reaches a terminal status or the budget runs out.
#[derive(Clone)]
pub struct StatusPoller {
    backend: SharedBackend,
}

impl StatusPoller {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Wait for `execution` to finish.
    ///
    /// Sleeps `budget.interval` before every query. A failed query still
    /// counts as an attempt and keeps the last known status. Never fails:
    /// an execution still running when the budget is spent comes back as
    /// `TIMED_OUT` without output.
    pub async fn await_terminal(&self, mut execution: Execution, budget: RetryBudget) -> Execution {
        while !execution.status.is_terminal() && execution.attempts < budget.max_attempts {
            tokio::time::sleep(budget.interval).await;
            execution.attempts += 1;

            match self.backend.describe_execution(&execution.handle).await {
                Ok(description) => {
                    debug!(
                        handle = %execution.handle,
                        attempt = execution.attempts,
                        status = %description.status,
                        "Polled execution"
                    );
                    execution.status = description.status;
                    if description.status.is_terminal() {
                        execution.output = description.output;
                    }
                }
                Err(e) => {
                    warn!(
                        handle = %execution.handle,
                        attempt = execution.attempts,
                        error = %e,
                        "Status query failed"
                    );
                }
            }
        }

        if execution.status == ExecutionStatus::Running {
            info!(
                handle = %execution.handle,
                attempts = execution.attempts,
                "Polling budget exhausted"
            );
            execution.status = ExecutionStatus::TimedOut;
        }
        if execution.status == ExecutionStatus::TimedOut {
            execution.output = None;
        }

        execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use sfn_harness_client::{CreateWorkflow, MockBackend, MockStatus, WorkflowBackend};

    const INTERVAL: Duration = Duration::from_millis(500);

    async fn started(backend: &MockBackend) -> Execution {
        let reference = backend
            .create_workflow(&CreateWorkflow {
                name: "Flow".into(),
                definition: "{}".into(),
                role: None,
            })
            .await
            .unwrap();
        let input = json!({"data": "x"});
        let handle = backend.start_execution(&reference, &input).await.unwrap();
        Execution::started(handle, input)
    }

    fn running() -> MockStatus {
        MockStatus::Status(ExecutionStatus::Running)
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_yields_timed_out_after_m_spaced_queries() {
        let backend = Arc::new(MockBackend::new().with_statuses(vec![running()]));
        let execution = started(&backend).await;
        let poller = StatusPoller::new(backend.clone());

        let start = tokio::time::Instant::now();
        let done = poller
            .await_terminal(execution, RetryBudget::new(INTERVAL, 4))
            .await;

        assert_eq!(done.status, ExecutionStatus::TimedOut);
        assert_eq!(done.attempts, 4);
        assert!(done.output.is_none());
        assert_eq!(backend.describe_count(), 4);

        let times = backend.describe_times();
        assert!(times[0] - start >= INTERVAL);
        for pair in times.windows(2) {
            assert!(pair[1] - pair[0] >= INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_terminal_status() {
        let backend = Arc::new(MockBackend::new().with_statuses(vec![
            running(),
            running(),
            MockStatus::Status(ExecutionStatus::Succeeded),
        ]));
        let execution = started(&backend).await;

        let done = StatusPoller::new(backend.clone())
            .await_terminal(execution, RetryBudget::new(INTERVAL, 10))
            .await;

        assert_eq!(done.status, ExecutionStatus::Succeeded);
        assert_eq!(done.attempts, 3);
        assert_eq!(done.output, Some(json!({"data": "x"})));
        assert_eq!(backend.describe_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_status_is_terminal() {
        let backend = Arc::new(
            MockBackend::new().with_statuses(vec![MockStatus::Status(ExecutionStatus::Failed)]),
        );
        let execution = started(&backend).await;

        let done = StatusPoller::new(backend.clone())
            .await_terminal(execution, RetryBudget::new(INTERVAL, 10))
            .await;
        assert_eq!(done.status, ExecutionStatus::Failed);
        assert_eq!(done.attempts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_errors_count_as_attempts() {
        let backend = Arc::new(MockBackend::new().with_statuses(vec![
            MockStatus::Error,
            MockStatus::Error,
            MockStatus::Status(ExecutionStatus::Succeeded),
        ]));
        let execution = started(&backend).await;

        let done = StatusPoller::new(backend.clone())
            .await_terminal(execution, RetryBudget::new(INTERVAL, 5))
            .await;
        assert_eq!(done.status, ExecutionStatus::Succeeded);
        assert_eq!(done.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_until_exhaustion_time_out() {
        let backend = Arc::new(MockBackend::new().with_statuses(vec![MockStatus::Error]));
        let execution = started(&backend).await;

        let done = StatusPoller::new(backend.clone())
            .await_terminal(execution, RetryBudget::new(INTERVAL, 3))
            .await;
        assert_eq!(done.status, ExecutionStatus::TimedOut);
        assert_eq!(done.attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_makes_no_queries() {
        let backend = Arc::new(MockBackend::new());
        let execution = started(&backend).await;

        let done = StatusPoller::new(backend.clone())
            .await_terminal(execution, RetryBudget::new(INTERVAL, 0))
            .await;
        assert_eq!(done.status, ExecutionStatus::TimedOut);
        assert_eq!(backend.describe_count(), 0);
    }
}
