//! Serve command - runs the execution facade.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::info;

use sfn_harness_config::HarnessConfig;
use sfn_harness_core::OutputFixture;
use sfn_harness_server::{AppState, Server, ServerConfig, WorkflowSettings};

use super::Context;

/// Arguments for the serve command.
///
/// CLI arguments override config file and environment values.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Primary port (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Fallback port used when the primary port is taken (overrides config)
    #[arg(long)]
    pub proxy_port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Never contact the backend; serve fixtures or synthesized output
    #[arg(long)]
    pub offline: bool,
}

impl ServeArgs {
    fn apply(&self, config: &mut HarnessConfig) {
        let server = config.server_mut();
        if let Some(port) = self.port {
            server.port = port;
        }
        if let Some(port) = self.proxy_port {
            server.proxy_port = port;
        }
        if let Some(bind) = &self.bind {
            server.bind = bind.clone();
        }
        if self.offline {
            config.backend_mut().offline = true;
        }
    }
}

/// Run the serve command.
pub async fn run(args: ServeArgs, ctx: &Context) -> Result<()> {
    let mut config = super::load_config(args.config.as_deref(), ctx)?;
    args.apply(&mut config);

    let settings = WorkflowSettings::from_config(&config)?;
    let unresolved = settings.definition.unresolved();
    if !unresolved.is_empty() {
        eprintln!("warning: unresolved template tokens: {}", unresolved.join(", "));
    }

    let server_config = ServerConfig::from_harness(&config);
    let mut state = AppState::new(server_config.clone(), settings);

    if !config.backend().offline {
        state = state.with_backend(super::build_backend(&config)?);
    }
    if let Some(path) = config.fixtures().output {
        let fixture = OutputFixture::load(&path)
            .with_context(|| format!("Failed to load output fixture {}", path.display()))?;
        state = state.with_fixture(fixture);
    }

    info!(
        primary = %server_config.bind_address,
        fallback = %server_config.proxy_address,
        offline = state.is_offline(),
        "Starting sfn-harness"
    );

    Server::from_state(state).run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ServeArgs {
        ServeArgs {
            config: None,
            port: None,
            proxy_port: None,
            bind: None,
            offline: false,
        }
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = HarnessConfig::from_toml("[server]\nport = 1000\n").unwrap();
        ServeArgs {
            port: Some(2000),
            proxy_port: Some(2001),
            bind: Some("0.0.0.0".into()),
            offline: true,
            ..args()
        }
        .apply(&mut config);

        let server = config.server();
        assert_eq!(server.port, 2000);
        assert_eq!(server.proxy_port, 2001);
        assert_eq!(server.bind, "0.0.0.0");
        assert!(config.backend().offline);
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let mut config =
            HarnessConfig::from_toml("[server]\nport = 1000\n[backend]\noffline = true\n")
                .unwrap();
        args().apply(&mut config);
        assert_eq!(config.server().port, 1000);
        assert!(config.backend().offline);
    }
}
