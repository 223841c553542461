//! Orchestration core of the Step Functions local harness.
//!
//! # Architecture
//!
//! ```text
//! WorkflowDefinition (template + bindings → resolved document)
//!         │
//!         ▼
//! Registrar ── delete stale, try roles in order, then no role
//!         │ RegisteredWorkflow
//!         ▼
//! ExecutionDriver ── start(reference, input)
//!         │ Execution { RUNNING }
//!         ▼
//! StatusPoller ── fixed interval, bounded attempts
//!         │ Execution { terminal }
//!         ▼
//! Synthesizer ── stand-in output whenever the backend cannot deliver
//! ```
//!
//! Every backend interaction goes through [`sfn_harness_client::WorkflowBackend`].

pub mod driver;
pub mod error;
pub mod fixture;
pub mod model;
pub mod poller;
pub mod registrar;
pub mod strategy;
pub mod synthesizer;
pub mod template;

pub use driver::ExecutionDriver;
pub use error::{HarnessError, Result};
pub use fixture::OutputFixture;
pub use model::{Execution, RegisteredWorkflow, RetryBudget};
pub use poller::StatusPoller;
pub use registrar::Registrar;
pub use strategy::first_success;
pub use synthesizer::{synthesize, synthesize_at, synthetic_execution_handle};
pub use template::{WorkflowDefinition, resolve, unresolved_tokens};

pub use sfn_harness_client::ExecutionStatus;
