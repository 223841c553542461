//! CLI command handlers.

pub mod serve;
pub mod setup;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use sfn_harness_client::{SharedBackend, StepFunctionsClient};
use sfn_harness_config::{HarnessConfig, LoadedConfig};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Load configuration: an explicit file, or discovered layers; then env overrides.
///
/// An explicit file that cannot be read or parsed is fatal. Discovered
/// layers that fail to parse only produce warnings.
pub fn load_config(explicit: Option<&Path>, ctx: &Context) -> Result<HarnessConfig> {
    let loaded = match explicit {
        Some(path) => LoadedConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => sfn_harness_config::load_config(None)?,
    };

    for warning in &loaded.warnings {
        eprintln!("warning: {}", warning);
    }

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            eprintln!("No config files found, using defaults");
        } else {
            for source in sources {
                eprintln!("Loaded config: {}", source.display());
            }
        }
    }

    let mut config = loaded.config;
    sfn_harness_config::apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Build the HTTP backend client from the `[backend]` section.
pub fn build_backend(config: &HarnessConfig) -> Result<SharedBackend> {
    let section = config.backend();
    let client = StepFunctionsClient::builder()
        .endpoint(&section.endpoint)
        .region(&section.region)
        .timeout(section.timeout())
        .build()
        .with_context(|| format!("Invalid backend endpoint {}", section.endpoint))?;
    Ok(Arc::new(client))
}
