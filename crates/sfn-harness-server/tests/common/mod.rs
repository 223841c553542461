//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use sfn_harness_client::MockBackend;
use sfn_harness_core::{RetryBudget, WorkflowDefinition};
use sfn_harness_server::{AppState, Server, ServerConfig, WorkflowSettings};

pub const WORKFLOW_NAME: &str = "DataProcessingStateMachine";

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client configured for this server.
    pub client: Client,
    /// Backend the server talks to, `None` when offline.
    pub backend: Option<Arc<MockBackend>>,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server backed by a healthy mock.
    pub async fn start() -> Result<Self> {
        Self::start_with_backend(MockBackend::new()).await
    }

    /// Start a server backed by the given mock.
    pub async fn start_with_backend(backend: MockBackend) -> Result<Self> {
        let backend = Arc::new(backend);
        let addr = find_available_port().await?;
        let state = AppState::new(config(addr), settings()).with_backend(backend.clone());
        Self::spawn(addr, state, Some(backend)).await
    }

    /// Start a server that never contacts a backend.
    pub async fn start_offline() -> Result<Self> {
        let addr = find_available_port().await?;
        let state = AppState::new(config(addr), settings());
        Self::spawn(addr, state, None).await
    }

    async fn spawn(
        addr: SocketAddr,
        state: AppState,
        backend: Option<Arc<MockBackend>>,
    ) -> Result<Self> {
        let server = Server::from_state(state);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::new();
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            backend,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(format!("{}{}", self.base_url(), path))
    }

    /// Check if server is healthy.
    pub async fn health(&self) -> Result<bool> {
        let resp = self.get("/health").send().await?;
        Ok(resp.status().is_success())
    }
}

pub fn config(addr: SocketAddr) -> ServerConfig {
    ServerConfig::new()
        .with_bind_address(addr)
        .with_request_logging(false)
}

pub fn settings() -> WorkflowSettings {
    let bindings = BTreeMap::from([(
        "ProcessDataFunctionArn".to_string(),
        "arn:aws:lambda:us-east-1:123456789012:function:ProcessDataFunction".to_string(),
    )]);
    WorkflowSettings {
        definition: WorkflowDefinition::new(
            WORKFLOW_NAME,
            r#"{"StartAt":"ProcessData","States":{"ProcessData":{"Type":"Task","Resource":"${ProcessDataFunctionArn}","End":true}}}"#,
            &bindings,
        ),
        role_candidates: vec![
            "arn:aws:iam::123456789012:role/service-role/StepFunctionsLocal".to_string(),
            "arn:aws:iam::123456789012:role/StepFunctionsLocal".to_string(),
        ],
        settle_interval: Duration::from_millis(1),
        placeholder_reference: format!(
            "arn:aws:states:us-east-1:123456789012:stateMachine:{}",
            WORKFLOW_NAME
        ),
        budget: RetryBudget::new(Duration::from_millis(10), 5),
    }
}

/// Find an available port for the test server.
pub async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
pub async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
