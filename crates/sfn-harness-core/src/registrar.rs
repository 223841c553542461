//! Idempotent workflow registration.
//!
//! Step Functions Local rejects a create when a same-named state machine
//! already exists, and which role ARNs it accepts varies between versions.
//! The registrar clears stale definitions first, then walks the role
//! candidates in order, then tries without a role.

use std::time::Duration;

use sfn_harness_client::{BackendError, CreateWorkflow, SharedBackend};
use tracing::{debug, info, warn};

use crate::error::{HarnessError, Result};
use crate::model::RegisteredWorkflow;
use crate::strategy::first_success;
use crate::template::WorkflowDefinition;

/// Default wait after deleting a stale definition.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_secs(1);

/// Registers workflow definitions against a backend.
#[derive(Clone)]
pub struct Registrar {
    backend: SharedBackend,
    settle_interval: Duration,
}

impl Registrar {
    pub fn new(backend: SharedBackend) -> Self {
        Self {
            backend,
            settle_interval: DEFAULT_SETTLE_INTERVAL,
        }
    }

    /// Set the wait applied after each stale-definition deletion.
    pub fn with_settle_interval(mut self, interval: Duration) -> Self {
        self.settle_interval = interval;
        self
    }

    /// Register a resolved definition.
    pub async fn register_definition(
        &self,
        definition: &WorkflowDefinition,
        role_candidates: &[String],
    ) -> Result<RegisteredWorkflow> {
        let unresolved = definition.unresolved();
        if !unresolved.is_empty() {
            warn!(
                name = %definition.name,
                tokens = ?unresolved,
                "Definition still contains unresolved tokens"
            );
        }
        self.register(&definition.name, &definition.resolved, role_candidates)
            .await
    }

    /// Ensure `name` is registered exactly once with the given document.
    ///
    /// Creation is attempted once per role candidate, in order, then once
    /// without a role. Fails with [`HarnessError::RegistrationExhausted`]
    /// when every attempt is rejected.
    pub async fn register(
        &self,
        name: &str,
        resolved: &str,
        role_candidates: &[String],
    ) -> Result<RegisteredWorkflow> {
        self.clear_stale(name).await;

        let attempts = role_candidates
            .iter()
            .cloned()
            .map(Some)
            .chain(std::iter::once(None));

        let result = first_success(attempts, |role: Option<String>| async move {
            let request = CreateWorkflow {
                name: name.to_string(),
                definition: resolved.to_string(),
                role: role.clone(),
            };
            match self.backend.create_workflow(&request).await {
                Ok(reference) => Ok(RegisteredWorkflow {
                    reference,
                    used_role: role,
                }),
                Err(e) => {
                    match &role {
                        Some(r) => warn!(name, role = %r, error = %e, "Registration rejected"),
                        None => warn!(name, error = %e, "Registration without role rejected"),
                    }
                    Err(e)
                }
            }
        })
        .await;

        match result {
            Ok(registered) => {
                info!(
                    name,
                    reference = %registered.reference,
                    role = ?registered.used_role,
                    "Workflow registered"
                );
                Ok(registered)
            }
            Err(errors) => Err(HarnessError::RegistrationExhausted {
                name: name.to_string(),
                attempts: errors.len(),
                last_error: errors
                    .last()
                    .map(BackendError::to_string)
                    .unwrap_or_default(),
            }),
        }
    }

    /// Delete every definition named `name`. Failures are logged, not returned.
    async fn clear_stale(&self, name: &str) {
        let existing = match self.backend.list_workflows().await {
            Ok(workflows) => workflows,
            Err(e) => {
                warn!(name, error = %e, "Listing workflows failed, continuing with creation");
                return;
            }
        };

        for workflow in existing.iter().filter(|w| w.name == name) {
            info!(name, reference = %workflow.reference, "Deleting stale workflow");
            match self.backend.delete_workflow(&workflow.reference).await {
                Ok(()) => {
                    debug!(settle_ms = self.settle_interval.as_millis() as u64, "Waiting for deletion to settle");
                    tokio::time::sleep(self.settle_interval).await;
                }
                Err(e) => {
                    warn!(name, reference = %workflow.reference, error = %e, "Deleting stale workflow failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use sfn_harness_client::{BackendCall, CreatePolicy, MockBackend, WorkflowSummary};

    const NAME: &str = "DataProcessingStateMachine";

    fn roles(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("arn:aws:iam::1:role/R{i}")).collect()
    }

    fn registrar(backend: &Arc<MockBackend>) -> Registrar {
        Registrar::new(backend.clone()).with_settle_interval(Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_first_candidate_accepted() {
        let backend = Arc::new(MockBackend::new());
        let registered = registrar(&backend)
            .register(NAME, "{}", &roles(4))
            .await
            .unwrap();

        assert_eq!(registered.used_role.as_deref(), Some("arn:aws:iam::1:role/R1"));
        assert_eq!(backend.create_attempts().len(), 1);
    }

    #[tokio::test]
    async fn test_kth_candidate_makes_exactly_k_attempts() {
        let candidates = roles(4);
        let backend = Arc::new(MockBackend::new().with_create_policy(CreatePolicy::AcceptOnly(
            vec![Some(candidates[2].clone())],
        )));

        let registered = registrar(&backend)
            .register(NAME, "{}", &candidates)
            .await
            .unwrap();

        assert_eq!(registered.used_role.as_ref(), Some(&candidates[2]));
        assert_eq!(
            backend.create_attempts(),
            vec![
                Some(candidates[0].clone()),
                Some(candidates[1].clone()),
                Some(candidates[2].clone()),
            ]
        );
    }

    #[tokio::test]
    async fn test_falls_back_to_no_role() {
        let backend = Arc::new(
            MockBackend::new().with_create_policy(CreatePolicy::AcceptOnly(vec![None])),
        );
        let registered = registrar(&backend)
            .register(NAME, "{}", &roles(3))
            .await
            .unwrap();

        assert_eq!(registered.used_role, None);
        let attempts = backend.create_attempts();
        assert_eq!(attempts.len(), 4);
        assert_eq!(attempts.last(), Some(&None));
    }

    #[tokio::test]
    async fn test_exhaustion_makes_n_plus_one_attempts() {
        let backend = Arc::new(MockBackend::new().with_create_policy(CreatePolicy::RejectAll));
        let err = registrar(&backend)
            .register(NAME, "{}", &roles(4))
            .await
            .unwrap_err();

        match err {
            HarnessError::RegistrationExhausted { name, attempts, .. } => {
                assert_eq!(name, NAME);
                assert_eq!(attempts, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(backend.create_attempts().len(), 5);
    }

    #[tokio::test]
    async fn test_zero_candidates_tries_no_role_once() {
        let backend = Arc::new(MockBackend::new());
        let registered = registrar(&backend).register(NAME, "{}", &[]).await.unwrap();
        assert_eq!(registered.used_role, None);
        assert_eq!(backend.create_attempts(), vec![None]);
    }

    #[tokio::test]
    async fn test_stale_definition_deleted_before_create() {
        let stale = WorkflowSummary {
            reference: "arn:old".into(),
            name: NAME.into(),
        };
        let other = WorkflowSummary {
            reference: "arn:other".into(),
            name: "SomethingElse".into(),
        };
        let backend = Arc::new(MockBackend::new().with_existing(vec![stale, other.clone()]));

        registrar(&backend)
            .register(NAME, "{}", &roles(1))
            .await
            .unwrap();

        let calls = backend.calls();
        assert_eq!(calls[0], BackendCall::List);
        assert_eq!(calls[1], BackendCall::Delete("arn:old".into()));
        assert!(matches!(calls[2], BackendCall::Create { .. }));
        assert!(backend.workflows().contains(&other));
    }

    #[tokio::test]
    async fn test_reregistration_is_idempotent() {
        let backend = Arc::new(MockBackend::new());
        let registrar = registrar(&backend);

        let first = registrar.register(NAME, "{}", &roles(1)).await.unwrap();
        let second = registrar.register(NAME, "{}", &roles(1)).await.unwrap();

        assert_eq!(first.reference, second.reference);
        assert_eq!(backend.workflows().len(), 1);
    }

    #[tokio::test]
    async fn test_listing_failure_is_not_fatal() {
        let backend = Arc::new(MockBackend::new().failing_list());
        let registered = registrar(&backend).register(NAME, "{}", &roles(2)).await;
        assert!(registered.is_ok());
    }

    #[tokio::test]
    async fn test_deletion_failure_is_not_fatal() {
        let stale = WorkflowSummary {
            reference: "arn:old".into(),
            name: NAME.into(),
        };
        let backend = Arc::new(MockBackend::new().with_existing(vec![stale]).failing_delete());

        // The stale definition survives, so creation hits a name conflict on
        // every attempt; the registrar still tries them all.
        let err = registrar(&backend)
            .register(NAME, "{}", &roles(2))
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::RegistrationExhausted { attempts: 3, .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_interval_after_delete() {
        let stale = WorkflowSummary {
            reference: "arn:old".into(),
            name: NAME.into(),
        };
        let backend = Arc::new(MockBackend::new().with_existing(vec![stale]));
        let registrar = Registrar::new(backend.clone());

        let start = tokio::time::Instant::now();
        registrar.register(NAME, "{}", &roles(1)).await.unwrap();
        assert!(start.elapsed() >= DEFAULT_SETTLE_INTERVAL);
    }

    #[tokio::test]
    async fn test_register_definition_uses_resolved_document() {
        let backend = Arc::new(MockBackend::new());
        let bindings: BTreeMap<String, String> =
            [("Fn".to_string(), "arn:fn".to_string())].into_iter().collect();
        let definition = WorkflowDefinition::new(NAME, r#"{"R":"${Fn}"}"#, &bindings);

        let registered = registrar(&backend)
            .register_definition(&definition, &roles(1))
            .await
            .unwrap();
        assert!(registered.reference.ends_with(NAME));
    }
}
