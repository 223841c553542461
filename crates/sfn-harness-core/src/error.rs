//! Error types for the harness core.

use sfn_harness_client::BackendError;
use thiserror::Error;

/// Result type for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur while registering or driving a workflow.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The definition template could not be read.
    #[error("Failed to read definition template '{path}': {source}")]
    TemplateRead {
        path: String,
        source: std::io::Error,
    },

    /// Every role candidate and the no-role attempt were rejected.
    #[error("Registration of '{name}' exhausted after {attempts} attempts: {last_error}")]
    RegistrationExhausted {
        name: String,
        attempts: usize,
        last_error: String,
    },

    /// The backend refused to start an execution.
    #[error("Failed to start execution of '{reference}': {source}")]
    StartFailed {
        reference: String,
        source: BackendError,
    },

    /// A fixture document could not be loaded.
    #[error("Invalid fixture '{path}': {reason}")]
    Fixture { path: String, reason: String },

    /// Backend error outside the cases above.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}
