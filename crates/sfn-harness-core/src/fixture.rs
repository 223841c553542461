//! Canned execution outputs read from disk.
//!
//! A fixture is either the bare output document or an envelope
//! `{ "status": ..., "output": ... }` where `output` may itself be a JSON
//! string, as the service returns it.

use std::path::Path;

use serde_json::Value;
use sfn_harness_client::{ExecutionStatus, decode_output};

use crate::error::{HarnessError, Result};

/// A canned output document.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputFixture {
    pub status: ExecutionStatus,
    pub output: Value,
}

impl OutputFixture {
    /// Read and parse a fixture file.
    pub fn load(path: &Path) -> Result<Self> {
        let fixture_err = |reason: String| HarnessError::Fixture {
            path: path.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(path).map_err(|e| fixture_err(e.to_string()))?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| fixture_err(e.to_string()))?;
        Self::from_document(document).map_err(fixture_err)
    }

    /// Interpret an already parsed fixture document.
    pub fn from_document(document: Value) -> std::result::Result<Self, String> {
        let is_envelope = document
            .as_object()
            .is_some_and(|o| o.contains_key("output") && o.contains_key("status"));
        if !is_envelope {
            if !document.is_object() {
                return Err("fixture must be a JSON object".to_string());
            }
            return Ok(Self {
                status: ExecutionStatus::Succeeded,
                output: document,
            });
        }

        let status = match document.get("status") {
            Some(Value::String(s)) => ExecutionStatus::from_backend(s),
            _ => return Err("'status' must be a string".to_string()),
        };
        let output = match document.get("output") {
            Some(Value::String(raw)) => decode_output(raw),
            Some(other) => other.clone(),
            None => Value::Null,
        };
        Ok(Self { status, output })
    }
}
