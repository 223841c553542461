//! Definition template resolution.
//!
//! Templates carry `${Token}` placeholders for resource identifiers that
//! differ per environment (Lambda ARNs, mostly). Resolution is plain textual
//! substitution over the whole document.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{HarnessError, Result};

/// A workflow definition before and after token substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    /// Unique name, stable across runs.
    pub name: String,
    /// Raw document with placeholders.
    pub template: String,
    /// Document with every bound placeholder replaced.
    pub resolved: String,
}

impl WorkflowDefinition {
    /// Resolve an in-memory template.
    pub fn new(
        name: impl Into<String>,
        template: impl Into<String>,
        bindings: &BTreeMap<String, String>,
    ) -> Self {
        let template = template.into();
        let resolved = resolve(&template, bindings);
        Self {
            name: name.into(),
            template,
            resolved,
        }
    }

    /// Read a template from disk and resolve it.
    pub fn load(
        name: impl Into<String>,
        path: &Path,
        bindings: &BTreeMap<String, String>,
    ) -> Result<Self> {
        let template = std::fs::read_to_string(path).map_err(|e| HarnessError::TemplateRead {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(Self::new(name, template, bindings))
    }

    /// Placeholders that survived resolution.
    pub fn unresolved(&self) -> Vec<String> {
        unresolved_tokens(&self.resolved)
    }
}

/// Replace every `${token}` whose token is bound, at every occurrence.
///
/// Unbound tokens are left as they are.
pub fn resolve(template: &str, bindings: &BTreeMap<String, String>) -> String {
    let mut resolved = template.to_string();
    for (token, identifier) in bindings {
        resolved = resolved.replace(&format!("${{{}}}", token), identifier);
    }
    resolved
}

/// List `${...}` tokens present in a document, in order of first appearance.
pub fn unresolved_tokens(document: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut remaining = document;

    while let Some(start) = remaining.find("${") {
        let after = &remaining[start + 2..];
        match after.find('}') {
            Some(end) => {
                let token = after[..end].trim();
                if !token.is_empty() && !tokens.iter().any(|t| t == token) {
                    tokens.push(token.to_string());
                }
                remaining = &after[end + 1..];
            }
            None => break,
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bindings(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let template = r#"{"A":"${Fn}","B":"${Fn}"}"#;
        let out = resolve(template, &bindings(&[("Fn", "arn:fn")]));
        assert_eq!(out, r#"{"A":"arn:fn","B":"arn:fn"}"#);
    }

    #[test]
    fn test_unbound_tokens_untouched() {
        let template = r#"{"A":"${Known}","B":"${Unknown}"}"#;
        let out = resolve(template, &bindings(&[("Known", "x")]));
        assert_eq!(out, r#"{"A":"x","B":"${Unknown}"}"#);
        assert_eq!(unresolved_tokens(&out), vec!["Unknown"]);
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let b = bindings(&[("Fn", "arn:fn")]);
        let once = resolve("${Fn}", &b);
        assert_eq!(resolve(&once, &b), once);
    }

    #[test]
    fn test_empty_bindings_returns_template() {
        let template = "no tokens ${Here}";
        assert_eq!(resolve(template, &BTreeMap::new()), template);
    }

    #[test]
    fn test_unresolved_tokens_dedup_and_unclosed() {
        let doc = "${A} ${B} ${A} ${ } ${open";
        assert_eq!(unresolved_tokens(doc), vec!["A", "B"]);
    }

    #[test]
    fn test_load_resolves_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flow.asl.json");
        std::fs::write(&path, r#"{"Resource":"${ProcessDataFunctionArn}"}"#).unwrap();

        let def = WorkflowDefinition::load(
            "Flow",
            &path,
            &bindings(&[("ProcessDataFunctionArn", "arn:aws:lambda:fn")]),
        )
        .unwrap();
        assert_eq!(def.name, "Flow");
        assert_eq!(def.resolved, r#"{"Resource":"arn:aws:lambda:fn"}"#);
        assert!(def.unresolved().is_empty());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let err = WorkflowDefinition::load("Flow", &dir.path().join("nope.json"), &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, HarnessError::TemplateRead { .. }));
    }
}
