//! Execution start.

use serde_json::Value;
use sfn_harness_client::SharedBackend;
use tracing::{debug, warn};

use crate::error::{HarnessError, Result};
use crate::model::Execution;

/// Starts executions of registered workflows.
#[derive(Clone)]
pub struct ExecutionDriver {
    backend: SharedBackend,
}

impl ExecutionDriver {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Start one execution of `reference` with `input` passed through unmodified.
    pub async fn start(&self, reference: &str, input: Value) -> Result<Execution> {
        match self.backend.start_execution(reference, &input).await {
            Ok(handle) => {
                debug!(reference, handle = %handle, "Execution started");
                Ok(Execution::started(handle, input))
            }
            Err(e) => {
                warn!(reference, error = %e, "Execution start rejected");
                Err(HarnessError::StartFailed {
                    reference: reference.to_string(),
                    source: e,
                })
            }
        }
    }
}
