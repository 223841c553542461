//! Configuration types mapping to the TOML schema.
//!
//! ```toml
//! [server]      # facade ports and logging
//! [backend]     # Step Functions endpoint
//! [workflow]    # definition name, template, role candidates, bindings
//! [poll]        # retry budget
//! [fixtures]    # canned outputs for offline mode
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default values, matching a stock Step Functions Local install.
pub mod defaults {
    pub const PORT: u16 = 8083;
    pub const PROXY_PORT: u16 = 8084;
    pub const BIND: &str = "127.0.0.1";
    pub const BACKEND_ENDPOINT: &str = "http://localhost:8083";
    pub const REGION: &str = "us-east-1";
    pub const BACKEND_TIMEOUT_SECS: u64 = 30;
    pub const WORKFLOW_NAME: &str = "DataProcessingStateMachine";
    pub const TEMPLATE_PATH: &str = "statemachine/data_processing.asl.json";
    pub const SETTLE_INTERVAL_MS: u64 = 1000;
    pub const PLACEHOLDER_REFERENCE: &str =
        "arn:aws:states:us-east-1:123456789012:stateMachine:DataProcessingStateMachine";
    pub const POLL_INTERVAL_MS: u64 = 1000;
    pub const MAX_POLL_ATTEMPTS: u32 = 30;

    /// Role ARNs Step Functions Local has been seen to accept, most specific first.
    pub const ROLE_CANDIDATES: &[&str] = &[
        "arn:aws:iam::123456789012:role/service-role/StepFunctionsLocal",
        "arn:aws:iam::123456789012:role/StepFunctionsLocal",
        "arn:aws:iam::012345678901:role/DummyRole",
        "arn:aws:iam::0123456789:role/DummyRole",
    ];

    /// Lambda ARNs substituted into the data-processing template.
    pub const BINDINGS: &[(&str, &str)] = &[
        (
            "ProcessDataFunctionArn",
            "arn:aws:lambda:us-east-1:123456789012:function:ProcessDataFunction",
        ),
        (
            "ValidateDataFunctionArn",
            "arn:aws:lambda:us-east-1:123456789012:function:ValidateDataFunction",
        ),
        (
            "StoreResultFunctionArn",
            "arn:aws:lambda:us-east-1:123456789012:function:StoreResultFunction",
        ),
    ];
}

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so partial configs (project-local overrides)
/// can be loaded and merged; use the accessors to get effective values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub server: Option<ServerSection>,
    pub backend: Option<BackendSection>,
    pub workflow: Option<WorkflowSection>,
    pub poll: Option<PollSection>,
    pub fixtures: Option<FixturesSection>,
}

impl HarnessConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: HarnessConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.workflow.is_some() {
            self.workflow = other.workflow;
        }
        if other.poll.is_some() {
            self.poll = other.poll;
        }
        if other.fixtures.is_some() {
            self.fixtures = other.fixtures;
        }
    }

    pub fn server(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    pub fn backend(&self) -> BackendSection {
        self.backend.clone().unwrap_or_default()
    }

    pub fn workflow(&self) -> WorkflowSection {
        self.workflow.clone().unwrap_or_default()
    }

    pub fn poll(&self) -> PollSection {
        self.poll.clone().unwrap_or_default()
    }

    pub fn fixtures(&self) -> FixturesSection {
        self.fixtures.clone().unwrap_or_default()
    }

    /// Mutable access to a section, materializing its defaults first.
    pub fn server_mut(&mut self) -> &mut ServerSection {
        self.server.get_or_insert_with(ServerSection::default)
    }

    pub fn backend_mut(&mut self) -> &mut BackendSection {
        self.backend.get_or_insert_with(BackendSection::default)
    }

    pub fn workflow_mut(&mut self) -> &mut WorkflowSection {
        self.workflow.get_or_insert_with(WorkflowSection::default)
    }

    pub fn poll_mut(&mut self) -> &mut PollSection {
        self.poll.get_or_insert_with(PollSection::default)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────────────────────────────────────

/// Facade server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind to.
    pub bind: String,
    /// Primary port. If it is already owned, the harness becomes a relay.
    pub port: u16,
    /// Fallback port the relay listens on.
    pub proxy_port: u16,
    /// Enable per-request logging middleware.
    pub request_logging: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: defaults::BIND.to_string(),
            port: defaults::PORT,
            proxy_port: defaults::PROXY_PORT,
            request_logging: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Workflow service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendSection {
    /// Base URL of the Step Functions (Local) endpoint.
    pub endpoint: String,
    /// Region placed in the credential scope sent to the service.
    pub region: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Never contact the backend; serve fixtures or synthesized output only.
    pub offline: bool,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            endpoint: defaults::BACKEND_ENDPOINT.to_string(),
            region: defaults::REGION.to_string(),
            timeout_secs: defaults::BACKEND_TIMEOUT_SECS,
            offline: false,
        }
    }
}

impl BackendSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workflow
// ─────────────────────────────────────────────────────────────────────────────

/// Workflow definition and registration settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowSection {
    /// Definition name, stable across runs.
    pub name: String,
    /// Path to the definition template.
    pub template: PathBuf,
    /// Role identifiers tried in order during registration.
    pub role_candidates: Vec<String>,
    /// Wait after deleting a stale definition, in milliseconds.
    pub settle_interval_ms: u64,
    /// Reference used when registration is exhausted.
    pub placeholder_reference: String,
    /// Template token → resource identifier.
    pub bindings: BTreeMap<String, String>,
}

impl Default for WorkflowSection {
    fn default() -> Self {
        Self {
            name: defaults::WORKFLOW_NAME.to_string(),
            template: PathBuf::from(defaults::TEMPLATE_PATH),
            role_candidates: defaults::ROLE_CANDIDATES
                .iter()
                .map(|r| r.to_string())
                .collect(),
            settle_interval_ms: defaults::SETTLE_INTERVAL_MS,
            placeholder_reference: defaults::PLACEHOLDER_REFERENCE.to_string(),
            bindings: defaults::BINDINGS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl WorkflowSection {
    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Poll
// ─────────────────────────────────────────────────────────────────────────────

/// Status polling budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollSection {
    /// Fixed wait between status queries, in milliseconds.
    pub interval_ms: u64,
    /// Maximum number of status queries.
    pub max_attempts: u32,
}

impl Default for PollSection {
    fn default() -> Self {
        Self {
            interval_ms: defaults::POLL_INTERVAL_MS,
            max_attempts: defaults::MAX_POLL_ATTEMPTS,
        }
    }
}

impl PollSection {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

/// Canned output documents for offline mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FixturesSection {
    /// Output fixture served instead of synthesized output, if present.
    pub output: Option<PathBuf>,
}
