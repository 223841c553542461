//! Per-request logging middleware.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::Level;

use crate::state::AppState;

/// Log method, path, status and duration of each request.
///
/// Server errors log at `error`, client errors at `warn`, the rest at `info`.
pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.request_logging {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;

    macro_rules! log_at {
        ($level:expr) => {
            tracing::event!(
                $level,
                method = %method,
                path = %path,
                status = status.as_u16(),
                duration_ms,
                "Request completed"
            )
        };
    }
    // `event!` needs a constant level.
    let level = level_for(status);
    if level == Level::ERROR {
        log_at!(Level::ERROR);
    } else if level == Level::WARN {
        log_at!(Level::WARN);
    } else {
        log_at!(Level::INFO);
    }

    response
}

fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}
