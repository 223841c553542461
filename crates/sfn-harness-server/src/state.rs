//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sfn_harness_client::SharedBackend;
use sfn_harness_config::HarnessConfig;
use sfn_harness_core::{
    OutputFixture, Registrar, RegisteredWorkflow, RetryBudget, WorkflowDefinition,
};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::ServerConfig;

/// Everything needed to register and drive the harness workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub definition: WorkflowDefinition,
    pub role_candidates: Vec<String>,
    pub settle_interval: Duration,
    /// Reference used when registration is exhausted.
    pub placeholder_reference: String,
    pub budget: RetryBudget,
}

impl WorkflowSettings {
    /// Load the definition template and collect workflow settings.
    pub fn from_config(config: &HarnessConfig) -> sfn_harness_core::Result<Self> {
        let workflow = config.workflow();
        let poll = config.poll();
        let definition =
            WorkflowDefinition::load(&workflow.name, &workflow.template, &workflow.bindings)?;
        let settle_interval = workflow.settle_interval();
        Ok(Self {
            definition,
            role_candidates: workflow.role_candidates,
            settle_interval,
            placeholder_reference: workflow.placeholder_reference,
            budget: RetryBudget::new(poll.interval(), poll.max_attempts),
        })
    }
}

/// Outcome of the one registration attempt per harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Registration {
    Registered(RegisteredWorkflow),
    /// Registration was exhausted; executions are synthesized.
    Placeholder(String),
}

impl Registration {
    pub fn reference(&self) -> &str {
        match self {
            Registration::Registered(r) => &r.reference,
            Registration::Placeholder(reference) => reference,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Registration::Placeholder(_))
    }
}

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// Workflow service. `None` runs the facade offline.
    pub backend: Option<SharedBackend>,

    pub workflow: Arc<WorkflowSettings>,

    /// Canned output served in place of synthesis.
    pub fixture: Option<Arc<OutputFixture>>,

    /// Registration, performed lazily by the first request that needs it.
    registration: Arc<OnceCell<Registration>>,
}

impl AppState {
    /// Create an offline state. Attach a backend with [`AppState::with_backend`].
    pub fn new(config: ServerConfig, workflow: WorkflowSettings) -> Self {
        Self {
            config: Arc::new(config),
            backend: None,
            workflow: Arc::new(workflow),
            fixture: None,
            registration: Arc::new(OnceCell::new()),
        }
    }

    pub fn with_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_fixture(mut self, fixture: OutputFixture) -> Self {
        self.fixture = Some(Arc::new(fixture));
        self
    }

    pub fn is_offline(&self) -> bool {
        self.backend.is_none()
    }

    /// The cached registration, registering on first use.
    ///
    /// Concurrent callers wait on a single in-flight registration. Offline
    /// state never contacts a backend and always yields the placeholder.
    pub async fn registration(&self) -> &Registration {
        self.registration
            .get_or_init(|| async {
                let Some(backend) = &self.backend else {
                    return Registration::Placeholder(self.workflow.placeholder_reference.clone());
                };

                debug!(backend = backend.name(), "Registering workflow");
                let registrar = Registrar::new(backend.clone())
                    .with_settle_interval(self.workflow.settle_interval);
                match registrar
                    .register_definition(&self.workflow.definition, &self.workflow.role_candidates)
                    .await
                {
                    Ok(registered) => Registration::Registered(registered),
                    Err(e) => {
                        warn!(
                            error = %e,
                            placeholder = %self.workflow.placeholder_reference,
                            "Registration failed, synthesizing all executions"
                        );
                        Registration::Placeholder(self.workflow.placeholder_reference.clone())
                    }
                }
            })
            .await
    }
}
