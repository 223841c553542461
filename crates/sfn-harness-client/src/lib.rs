//! Backend seam for the Step Functions local harness.
//!
//! The harness talks to the workflow service only through the
//! [`WorkflowBackend`] trait. Two implementations live here:
//!
//! - [`StepFunctionsClient`]: speaks the AWS JSON 1.0 protocol to a
//!   Step Functions (Local) endpoint over HTTP.
//! - `MockBackend` (feature `testing`): scripted, in-memory, records every call.
//!
//! # Example
//!
//! ```no_run
//! use sfn_harness_client::{StepFunctionsClient, WorkflowBackend, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = StepFunctionsClient::builder()
//!     .endpoint("http://localhost:8083")
//!     .build()?;
//!
//! for workflow in client.list_workflows().await? {
//!     println!("{} -> {}", workflow.name, workflow.reference);
//! }
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod error;
pub mod types;

#[cfg(any(test, feature = "testing"))]
pub mod mock;

pub use backend::{SharedBackend, WorkflowBackend};
pub use client::{ClientBuilder, StepFunctionsClient};
pub use error::{BackendError, Result};
pub use types::*;
pub use url::Url;

#[cfg(any(test, feature = "testing"))]
pub use mock::{BackendCall, CreatePolicy, MockBackend, MockStatus};
