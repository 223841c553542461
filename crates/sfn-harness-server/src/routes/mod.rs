//! HTTP routes.

pub mod execution;
pub mod health;

pub use execution::{ExecutionRequest, ExecutionResponse, execution_handler, execution_routes};
pub use health::{HealthResponse, health_routes};

use crate::error::ServerError;

/// Fallback for every unknown path and method.
pub async fn not_found() -> ServerError {
    ServerError::not_found()
}
