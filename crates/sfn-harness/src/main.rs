//! sfn-harness - local test harness for Step Functions workflows
//!
//! Main entry point for the sfn-harness CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{serve, setup};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// sfn-harness - run Step Functions workflows locally, with or without a backend
#[derive(Parser)]
#[command(name = "sfn-harness")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the execution facade (or relay, if the port is taken)
    Serve(serve::ServeArgs),

    /// Register the workflow and run one sample execution
    Setup(setup::SetupArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + daily rolling JSON file
    let filter = if cli.verbose {
        "sfn_harness=debug,sfn_harness_core=debug,sfn_harness_client=debug,sfn_harness_server=debug,sfn_harness_config=debug,info"
    } else {
        "sfn_harness=info,sfn_harness_core=info,sfn_harness_client=info,sfn_harness_server=info,warn"
    };

    let log_dir = sfn_harness_config::user_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "sfn-harness.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "sfn_harness=trace,sfn_harness_core=trace,sfn_harness_client=trace,sfn_harness_server=trace,sfn_harness_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Setup(args) => setup::run(args, &ctx).await,
    }
}
