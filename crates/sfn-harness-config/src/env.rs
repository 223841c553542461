//! Environment variable overrides.
//!
//! Applied after file layers and before CLI flags.

use crate::{ConfigError, HarnessConfig, Result};

pub const PORT_ENV: &str = "SFN_HARNESS_PORT";
pub const PROXY_PORT_ENV: &str = "SFN_HARNESS_PROXY_PORT";
pub const POLL_INTERVAL_ENV: &str = "SFN_HARNESS_POLL_INTERVAL_MS";
pub const MAX_POLL_ATTEMPTS_ENV: &str = "SFN_HARNESS_MAX_POLL_ATTEMPTS";
pub const ROLE_CANDIDATES_ENV: &str = "SFN_HARNESS_ROLE_CANDIDATES";
pub const BACKEND_ENDPOINT_ENV: &str = "SFN_HARNESS_BACKEND_ENDPOINT";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut HarnessConfig) -> Result<()> {
    apply_overrides_from(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup.
///
/// Empty values are ignored.
pub fn apply_overrides_from<F>(config: &mut HarnessConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(PORT_ENV) {
        config.server_mut().port = parse(PORT_ENV, &v)?;
    }
    if let Some(v) = get(PROXY_PORT_ENV) {
        config.server_mut().proxy_port = parse(PROXY_PORT_ENV, &v)?;
    }
    if let Some(v) = get(POLL_INTERVAL_ENV) {
        config.poll_mut().interval_ms = parse(POLL_INTERVAL_ENV, &v)?;
    }
    if let Some(v) = get(MAX_POLL_ATTEMPTS_ENV) {
        config.poll_mut().max_attempts = parse(MAX_POLL_ATTEMPTS_ENV, &v)?;
    }
    if let Some(v) = get(ROLE_CANDIDATES_ENV) {
        config.workflow_mut().role_candidates = v
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(v) = get(BACKEND_ENDPOINT_ENV) {
        config.backend_mut().endpoint = v;
    }

    Ok(())
}

fn parse<T>(var: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidOverride {
            var: var.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
