//! HTTP facade for the Step Functions local harness.
//!
//! The facade accepts execution requests, runs them against the workflow
//! backend, and answers with the execution output. When the backend cannot
//! deliver one, a fixture or a synthesized output stands in.
//!
//! # Endpoints
//!
//! - `POST /execution` run the harness workflow (or an explicit one)
//! - `GET /health` readiness probe
//!
//! # Serve modes
//!
//! [`Server::run`] binds the primary port. If that port is already owned,
//! the server turns into a [`Relay`] on the fallback port instead.
//!
//! # Example
//!
//! ```ignore
//! use sfn_harness_server::{AppState, Server, ServerConfig, WorkflowSettings};
//!
//! let settings = WorkflowSettings::from_config(&harness_config)?;
//! let state = AppState::new(ServerConfig::from_harness(&harness_config), settings)
//!     .with_backend(backend);
//! Server::from_state(state).run().await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod relay;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use logging::request_logging_middleware;
pub use relay::{Relay, ServeMode};
pub use routes::{ExecutionRequest, ExecutionResponse, HealthResponse};
pub use state::{AppState, Registration, WorkflowSettings};

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::{Router, extract::DefaultBodyLimit, middleware};
use sfn_harness_client::Url;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// The harness facade server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::health_routes())
            .merge(routes::execution_routes())
            .fallback(routes::not_found)
            .layer(DefaultBodyLimit::max(self.state.config.max_body_size))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run in whichever mode the primary port allows.
    pub async fn run(self) -> Result<()> {
        let mode = ServeMode::select(
            self.state.config.bind_address,
            self.state.config.proxy_address,
        )
        .await?;
        self.run_mode(mode).await
    }

    /// Run in an already selected mode.
    pub async fn run_mode(self, mode: ServeMode) -> Result<()> {
        match mode {
            ServeMode::Direct(listener) => self.serve(listener).await,
            ServeMode::Relay(relay) => {
                info!(upstream = %relay.upstream(), "Serving as relay");
                relay.run().await
            }
        }
    }

    /// Run the facade on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        self.serve(listener).await
    }

    async fn serve(mut self, listener: TcpListener) -> Result<()> {
        let addr = listener
            .local_addr()
            .map_err(|e| ServerError::Internal(format!("Failed to read local address: {}", e)))?;

        let own_endpoint = self
            .state
            .backend
            .as_ref()
            .and_then(|backend| backend.endpoint_url())
            .filter(|endpoint| targets_listener(endpoint, addr))
            .map(Url::to_string);
        if let Some(endpoint) = own_endpoint {
            warn!(
                %addr,
                %endpoint,
                "Backend endpoint is this facade's own listener, serving offline"
            );
            self.state.backend = None;
        }

        // Registration happens on the first request that needs it.
        info!(%addr, offline = self.state.is_offline(), "Starting facade");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}

/// Whether `endpoint` would connect back to a facade listening on `listener`.
fn targets_listener(endpoint: &Url, listener: SocketAddr) -> bool {
    if endpoint.port_or_known_default() != Some(listener.port()) {
        return false;
    }
    let Some(host) = endpoint.host_str() else {
        return false;
    };
    let ip = if host.eq_ignore_ascii_case("localhost") {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        match host.trim_start_matches('[').trim_end_matches(']').parse::<IpAddr>() {
            Ok(ip) => ip,
            Err(_) => return false,
        }
    };

    let bound = listener.ip();
    ip == bound
        || (bound.is_unspecified() && (ip.is_loopback() || ip.is_unspecified()))
        || (bound.is_loopback() && ip.is_loopback())
}
