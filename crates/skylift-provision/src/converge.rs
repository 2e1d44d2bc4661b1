//! Converge engine
//!
//! `converge` brings one remote resource to match a descriptor: probe
//! existence, then create, replace, or update in place according to the
//! descriptor kind's strategy. The whole sequence is idempotent; retries are
//! the caller's responsibility and re-invoking after any failure is safe.

use tracing::{debug, error, info, warn};

use crate::descriptor::{ConvergeStrategy, ResourceDescriptor};
use crate::error::{ProvisionError, Result};
use crate::provider::{Provider, ProviderError};
use crate::waiter::{OperationStatus, WaitConfig, await_completion};

/// Outcome of one converge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    /// The resource was already present and its kind is create-only
    AlreadyExists,
    /// The resource was absent and has been created
    Created,
    /// The resource was present and has been replaced or updated in place
    Replaced,
}

/// Converges descriptors against one provider handle
pub struct Converger<'a, P: Provider + ?Sized> {
    provider: &'a P,
    wait: WaitConfig,
}

impl<'a, P: Provider + ?Sized> Converger<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self::with_wait(provider, WaitConfig::default())
    }

    pub fn with_wait(provider: &'a P, wait: WaitConfig) -> Self {
        Self { provider, wait }
    }

    /// Bring the resource named by `descriptor` to its desired state.
    ///
    /// Validation runs before any provider call. Exactly one create call is
    /// issued for an absent resource; replace-strategy kinds issue exactly
    /// one delete then one create. A delete that succeeds followed by a
    /// create that fails leaves the resource absent and surfaces as
    /// [`ProvisionError::Inconsistent`]; converging again repairs it.
    pub async fn converge(&self, descriptor: &ResourceDescriptor) -> Result<Convergence> {
        descriptor.validate()?;
        let identity = descriptor.identity();

        debug!(provider = self.provider.name(), %identity, "probing existence");
        let present = match self.provider.exists(descriptor).await {
            Ok(present) => present,
            Err(ProviderError::NotFound(_)) => false,
            Err(err) => return Err(self.annotate("probe", &identity, err)),
        };

        if !present {
            info!(%identity, "absent, creating");
            self.provider
                .create(descriptor)
                .await
                .map_err(|e| self.annotate("create", &identity, e))?;
            info!(%identity, "created");
            return Ok(Convergence::Created);
        }

        match descriptor.kind().strategy() {
            ConvergeStrategy::CreateOnly => {
                debug!(%identity, "already exists, leaving as-is");
                Ok(Convergence::AlreadyExists)
            }
            ConvergeStrategy::Replace => self.replace(descriptor, &identity).await,
            ConvergeStrategy::UpdateInPlace => self.update_in_place(descriptor, &identity).await,
        }
    }

    async fn replace(
        &self,
        descriptor: &ResourceDescriptor,
        identity: &str,
    ) -> Result<Convergence> {
        warn!(%identity, "exists, replacing with new definition");
        self.provider
            .delete(descriptor)
            .await
            .map_err(|e| self.annotate("delete", identity, e))?;

        // The delete has landed; a create failure here leaves the resource
        // absent until the caller converges again.
        match self.provider.create(descriptor).await {
            Ok(()) => {
                info!(%identity, "replaced");
                Ok(Convergence::Replaced)
            }
            Err(err) => Err(ProvisionError::Inconsistent {
                identity: identity.to_string(),
                message: err.to_string(),
            }),
        }
    }

    async fn update_in_place(
        &self,
        descriptor: &ResourceDescriptor,
        identity: &str,
    ) -> Result<Convergence> {
        info!(%identity, "exists, updating in place");
        let initial = self
            .provider
            .begin_update(descriptor)
            .await
            .map_err(|e| self.annotate("update", identity, e))?;

        let status = if initial.is_terminal() {
            initial
        } else {
            debug!(%identity, %initial, "update accepted, awaiting completion");
            await_completion(
                identity,
                || self.provider.operation_status(descriptor),
                &self.wait,
            )
            .await?
        };

        if status == OperationStatus::Failed {
            return Err(ProvisionError::OperationFailed {
                identity: identity.to_string(),
                last: status,
            });
        }

        self.provider
            .finish_update(descriptor)
            .await
            .map_err(|e| self.annotate("finish update", identity, e))?;
        info!(%identity, "updated in place");
        Ok(Convergence::Replaced)
    }

    fn annotate(
        &self,
        operation: &'static str,
        identity: &str,
        err: ProviderError,
    ) -> ProvisionError {
        error!(%identity, %operation, %err, "provider call failed");
        ProvisionError::Provider {
            operation,
            identity: identity.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FunctionSpec, MethodSpec, RestResourceSpec};
    use crate::in_memory::{InMemoryProvider, ProviderOp};

    fn method() -> ResourceDescriptor {
        ResourceDescriptor::Method(MethodSpec {
            api_id: "a1".to_string(),
            resource_id: "r1".to_string(),
            http_method: "GET".to_string(),
            api_key_required: true,
        })
    }

    fn rest_resource() -> ResourceDescriptor {
        ResourceDescriptor::RestResource(RestResourceSpec {
            api_id: "a1".to_string(),
            parent_id: "root".to_string(),
            path_part: "reports".to_string(),
        })
    }

    fn function() -> ResourceDescriptor {
        ResourceDescriptor::Function(FunctionSpec {
            name: "ingest".to_string(),
            role_arn: "arn:aws:iam::123456789012:role/ingest".to_string(),
            architecture: "arm64".to_string(),
            runtime: "provided.al2023".to_string(),
            handler: "bootstrap".to_string(),
            code_bucket: "artifacts".to_string(),
            code_key: "ingest.zip".to_string(),
            publish: true,
            dry_run: false,
        })
    }

    #[tokio::test]
    async fn absent_resource_issues_exactly_one_create() {
        let provider = InMemoryProvider::new();
        let converger = Converger::new(&provider);

        let outcome = converger.converge(&method()).await.unwrap();

        assert_eq!(outcome, Convergence::Created);
        assert_eq!(provider.call_count(ProviderOp::Create).await, 1);
        assert_eq!(provider.call_count(ProviderOp::Delete).await, 0);
    }

    #[tokio::test]
    async fn create_only_kind_is_left_untouched_when_present() {
        let provider = InMemoryProvider::new();
        let converger = Converger::new(&provider);
        let descriptor = rest_resource();

        assert_eq!(
            converger.converge(&descriptor).await.unwrap(),
            Convergence::Created
        );
        assert_eq!(
            converger.converge(&descriptor).await.unwrap(),
            Convergence::AlreadyExists
        );
        assert_eq!(provider.call_count(ProviderOp::Create).await, 1);
    }

    #[tokio::test]
    async fn replace_kind_deletes_then_creates_in_order() {
        let provider = InMemoryProvider::new();
        let converger = Converger::new(&provider);
        let descriptor = method();

        assert_eq!(
            converger.converge(&descriptor).await.unwrap(),
            Convergence::Created
        );
        assert_eq!(
            converger.converge(&descriptor).await.unwrap(),
            Convergence::Replaced
        );

        let ops: Vec<ProviderOp> = provider.calls().await.into_iter().map(|c| c.op).collect();
        let mutations: Vec<ProviderOp> = ops
            .into_iter()
            .filter(|op| matches!(op, ProviderOp::Create | ProviderOp::Delete))
            .collect();
        assert_eq!(
            mutations,
            vec![ProviderOp::Create, ProviderOp::Delete, ProviderOp::Create]
        );
    }

    #[tokio::test]
    async fn failed_recreate_surfaces_inconsistent() {
        let provider = InMemoryProvider::new();
        let converger = Converger::new(&provider);
        let descriptor = method();

        converger.converge(&descriptor).await.unwrap();
        provider
            .fail_on(ProviderOp::Create, &descriptor.identity())
            .await;

        let err = converger.converge(&descriptor).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Inconsistent { .. }));
        // The delete landed, so the resource is now absent.
        assert!(!provider.contains(&descriptor.identity()).await);
    }

    #[tokio::test]
    async fn function_update_runs_to_completion_then_applies_settings() {
        let provider = InMemoryProvider::new();
        let converger = Converger::new(&provider);
        let descriptor = function();

        converger.converge(&descriptor).await.unwrap();
        provider
            .script_statuses([OperationStatus::InProgress, OperationStatus::Succeeded])
            .await;

        let outcome = converger.converge(&descriptor).await.unwrap();

        assert_eq!(outcome, Convergence::Replaced);
        assert_eq!(provider.call_count(ProviderOp::BeginUpdate).await, 1);
        assert_eq!(provider.call_count(ProviderOp::FinishUpdate).await, 1);
        // Functions are never replaced by delete/recreate.
        assert_eq!(provider.call_count(ProviderOp::Delete).await, 0);
    }

    #[tokio::test]
    async fn failed_update_skips_settings_application() {
        let provider = InMemoryProvider::new();
        let converger = Converger::new(&provider);
        let descriptor = function();

        converger.converge(&descriptor).await.unwrap();
        provider.script_statuses([OperationStatus::Failed]).await;

        let err = converger.converge(&descriptor).await.unwrap_err();

        assert!(matches!(err, ProvisionError::OperationFailed { .. }));
        assert_eq!(provider.call_count(ProviderOp::FinishUpdate).await, 0);
    }

    #[tokio::test]
    async fn validation_fails_before_any_provider_call() {
        let provider = InMemoryProvider::new();
        let converger = Converger::new(&provider);
        let descriptor = ResourceDescriptor::Method(MethodSpec {
            api_id: String::new(),
            resource_id: "r1".to_string(),
            http_method: "GET".to_string(),
            api_key_required: false,
        });

        let err = converger.converge(&descriptor).await.unwrap_err();

        assert!(matches!(err, ProvisionError::Validation(_)));
        assert!(provider.calls().await.is_empty());
    }

    #[tokio::test]
    async fn probe_failure_propagates_without_mutation() {
        let provider = InMemoryProvider::new();
        let converger = Converger::new(&provider);
        let descriptor = method();
        provider
            .fail_on(ProviderOp::Exists, &descriptor.identity())
            .await;

        let err = converger.converge(&descriptor).await.unwrap_err();

        assert!(matches!(
            err,
            ProvisionError::Provider {
                operation: "probe",
                ..
            }
        ));
        assert_eq!(provider.call_count(ProviderOp::Create).await, 0);
    }
}
