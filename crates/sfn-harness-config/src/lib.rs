//! Configuration system for the Step Functions local harness.
//!
//! Provides TOML-based configuration with:
//! - Config file layering (user config dir + project-local overrides)
//! - Environment variable overrides for the options a CI job usually tweaks
//!   (ports, poll budget, role candidates, backend endpoint)
//! - Defaults that reproduce the stock Step Functions Local setup
//!
//! CLI flags are applied on top by the binary.

pub mod discovery;
pub mod env;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, load_config, load_config_file, load_config_with_options, user_config_dir,
    user_config_path,
};
pub use env::{apply_env_overrides, apply_overrides_from};
pub use error::{ConfigError, Result};
pub use types::*;
