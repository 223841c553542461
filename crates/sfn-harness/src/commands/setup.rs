//! Setup command - one-shot registration and sample run against a backend.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use serde_json::json;

use sfn_harness_core::{ExecutionDriver, Registrar, StatusPoller};
use sfn_harness_server::WorkflowSettings;

use super::Context;

/// Arguments for the setup command.
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the setup command.
///
/// Fails when the backend cannot be reached or registration is exhausted.
/// A sample execution that does not succeed is reported, not fatal.
pub async fn run(args: SetupArgs, ctx: &Context) -> Result<()> {
    let config = super::load_config(args.config.as_deref(), ctx)?;
    let endpoint = config.backend().endpoint;
    let backend = super::build_backend(&config)?;

    println!("Checking backend at {}", endpoint);
    if let Err(e) = backend.list_workflows().await {
        if e.is_unreachable() {
            bail!("Backend unreachable at {}: {}", endpoint, e);
        }
        bail!("Backend at {} rejected listing: {}", endpoint, e);
    }

    let settings = WorkflowSettings::from_config(&config)?;
    let registered = Registrar::new(backend.clone())
        .with_settle_interval(settings.settle_interval)
        .register_definition(&settings.definition, &settings.role_candidates)
        .await?;

    println!("Registered {}", registered.reference);
    match &registered.used_role {
        Some(role) => println!("Role: {}", role),
        None => println!("Role: (none)"),
    }

    let input = json!({"data": "sample-test-data-123", "source": "test-automation"});
    let execution = ExecutionDriver::new(backend.clone())
        .start(&registered.reference, input)
        .await?;
    println!("Started {}", execution.handle);

    let execution = StatusPoller::new(backend)
        .await_terminal(execution, settings.budget)
        .await;
    println!(
        "Execution {} after {} status queries",
        execution.status, execution.attempts
    );
    if let Some(output) = &execution.output {
        println!("{}", serde_json::to_string_pretty(output)?);
    }

    println!();
    println!("State machine ARN: {}", registered.reference);
    Ok(())
}
