//! Endpoint assembler
//!
//! Sequences converge calls across one logical REST endpoint's dependency
//! chain: every method and its integration, then a deployment snapshot, then
//! the stage, then the live API configuration. Steps run in a fixed total
//! order and the first failure aborts the run. Already-converged steps are
//! left applied; each is independently idempotent, so re-running the whole
//! assembly is the recovery path.

use std::fmt;

use tracing::{debug, info};

use crate::converge::{Convergence, Converger};
use crate::descriptor::{
    IntegrationSpec, MethodBinding, MethodSpec, ResourceDescriptor, ResourceKind, StageSpec,
};
use crate::error::{ProvisionError, Result};
use crate::provider::Provider;
use crate::waiter::WaitConfig;

/// Ordered converge steps for one logical endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointPlan {
    pub api_id: String,
    pub stage_name: String,
    /// Method and integration descriptors, processed strictly in order
    pub steps: Vec<ResourceDescriptor>,
}

impl EndpointPlan {
    pub fn new(api_id: impl Into<String>, stage_name: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            stage_name: stage_name.into(),
            steps: Vec::new(),
        }
    }

    /// Build the method/integration chain binding each HTTP method of one
    /// resource to the function behind `invoke_uri`
    pub fn for_function(
        api_id: impl Into<String>,
        resource_id: &str,
        stage_name: impl Into<String>,
        invoke_uri: &str,
        bindings: &[MethodBinding],
    ) -> Self {
        let mut plan = Self::new(api_id, stage_name);
        for binding in bindings {
            plan.steps
                .push(ResourceDescriptor::Method(MethodSpec {
                    api_id: plan.api_id.clone(),
                    resource_id: resource_id.to_string(),
                    http_method: binding.name.clone(),
                    api_key_required: true,
                }));
            plan.steps
                .push(ResourceDescriptor::Integration(IntegrationSpec {
                    api_id: plan.api_id.clone(),
                    resource_id: resource_id.to_string(),
                    http_method: binding.name.clone(),
                    uri: invoke_uri.to_string(),
                    request_parameters: binding.request_parameters.clone(),
                }));
        }
        plan
    }

    /// Fail-fast plan validation: identity fields present, only method and
    /// integration steps (deployment and stage are sequenced by the
    /// assembler itself)
    pub fn validate(&self) -> Result<()> {
        if self.api_id.trim().is_empty() {
            return Err(ProvisionError::Validation("api id can not be empty".into()));
        }
        if self.stage_name.trim().is_empty() {
            return Err(ProvisionError::Validation(
                "stage name can not be empty".into(),
            ));
        }
        for step in &self.steps {
            match step.kind() {
                ResourceKind::Method | ResourceKind::Integration => {}
                other => {
                    return Err(ProvisionError::Validation(format!(
                        "endpoint plan steps must be methods or integrations, found {other}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Assembly progress, reported in log lines as the run advances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblyPhase {
    NotStarted,
    MethodsConverging,
    Deploying,
    StageConverging,
    Finalizing,
    Done,
}

impl fmt::Display for AssemblyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssemblyPhase::NotStarted => "not started",
            AssemblyPhase::MethodsConverging => "methods converging",
            AssemblyPhase::Deploying => "deploying",
            AssemblyPhase::StageConverging => "stage converging",
            AssemblyPhase::Finalizing => "finalizing",
            AssemblyPhase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Per-step outcomes of a completed assembly
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    /// Identity and outcome of every plan step, in execution order
    pub steps: Vec<(String, Convergence)>,
    /// Deployment created for this assembly
    pub deployment_id: String,
    /// Stage outcome (`Created` or `AlreadyExists`; stages are update-free)
    pub stage: Convergence,
}

/// Run one endpoint assembly to completion against `provider`.
///
/// Returns a report only if every step succeeded; otherwise the first
/// failure's error, with later steps never attempted and earlier steps left
/// applied.
pub async fn assemble_endpoint<P: Provider + ?Sized>(
    provider: &P,
    plan: &EndpointPlan,
    wait: &WaitConfig,
) -> Result<AssemblyReport> {
    plan.validate()?;

    let converger = Converger::with_wait(provider, wait.clone());
    let mut phase = AssemblyPhase::MethodsConverging;
    info!(api_id = %plan.api_id, stage = %plan.stage_name, %phase, steps = plan.steps.len(), "assembling endpoint");

    let mut outcomes = Vec::with_capacity(plan.steps.len());
    for step in &plan.steps {
        let outcome = converger.converge(step).await?;
        debug!(step = %step.identity(), ?outcome, "step converged");
        outcomes.push((step.identity(), outcome));
    }

    phase = AssemblyPhase::Deploying;
    debug!(api_id = %plan.api_id, %phase, "creating deployment");
    let deployment_id =
        provider
            .create_deployment(&plan.api_id)
            .await
            .map_err(|e| ProvisionError::Provider {
                operation: "create deployment",
                identity: format!("api {}", plan.api_id),
                message: e.to_string(),
            })?;

    phase = AssemblyPhase::StageConverging;
    debug!(api_id = %plan.api_id, %phase, %deployment_id, "converging stage");
    let stage = converger
        .converge(&ResourceDescriptor::Stage(StageSpec {
            api_id: plan.api_id.clone(),
            stage_name: plan.stage_name.clone(),
            deployment_id: deployment_id.clone(),
        }))
        .await?;

    phase = AssemblyPhase::Finalizing;
    debug!(api_id = %plan.api_id, %phase, "applying deployment to live configuration");
    provider
        .finalize_api(&plan.api_id)
        .await
        .map_err(|e| ProvisionError::Provider {
            operation: "finalize",
            identity: format!("api {}", plan.api_id),
            message: e.to_string(),
        })?;

    phase = AssemblyPhase::Done;
    info!(api_id = %plan.api_id, stage = %plan.stage_name, %phase, %deployment_id, "endpoint assembled");
    Ok(AssemblyReport {
        steps: outcomes,
        deployment_id,
        stage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::{InMemoryProvider, ProviderOp};

    fn plan() -> EndpointPlan {
        EndpointPlan::for_function(
            "a1",
            "r1",
            "prod",
            "arn:aws:apigateway:eu-west-1:lambda:path/2015-03-31/functions/demo/invocations",
            &[MethodBinding::new("GET"), MethodBinding::new("POST")],
        )
    }

    #[tokio::test]
    async fn full_assembly_converges_every_step_then_deploys() {
        let provider = InMemoryProvider::new();

        let report = assemble_endpoint(&provider, &plan(), &WaitConfig::default())
            .await
            .unwrap();

        assert_eq!(report.steps.len(), 4);
        assert!(
            report
                .steps
                .iter()
                .all(|(_, outcome)| *outcome == Convergence::Created)
        );
        assert_eq!(report.stage, Convergence::Created);
        assert_eq!(provider.call_count(ProviderOp::CreateDeployment).await, 1);
        assert_eq!(provider.call_count(ProviderOp::FinalizeApi).await, 1);
    }

    #[tokio::test]
    async fn failing_step_aborts_before_later_steps() {
        let provider = InMemoryProvider::new();
        let plan = plan();
        // Second step is the GET integration.
        provider
            .fail_on(ProviderOp::Create, &plan.steps[1].identity())
            .await;

        let err = assemble_endpoint(&provider, &plan, &WaitConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Provider { .. }));
        // Steps three and four were never attempted, nor was the deployment.
        assert!(!provider.contains(&plan.steps[2].identity()).await);
        assert!(!provider.contains(&plan.steps[3].identity()).await);
        assert_eq!(provider.call_count(ProviderOp::CreateDeployment).await, 0);
        // The first step stays applied; there is no rollback.
        assert!(provider.contains(&plan.steps[0].identity()).await);
    }

    #[tokio::test]
    async fn existing_stage_is_left_as_is() {
        let provider = InMemoryProvider::new();
        let plan = plan();
        provider
            .seed(ResourceDescriptor::Stage(StageSpec {
                api_id: "a1".to_string(),
                stage_name: "prod".to_string(),
                deployment_id: "d0".to_string(),
            }))
            .await;

        let report = assemble_endpoint(&provider, &plan, &WaitConfig::default())
            .await
            .unwrap();

        assert_eq!(report.stage, Convergence::AlreadyExists);
        // A deployment is still created each assembly.
        assert!(report.deployment_id.starts_with("deployment-"));
    }

    #[tokio::test]
    async fn plan_rejects_foreign_step_kinds() {
        let mut plan = plan();
        plan.steps.push(ResourceDescriptor::Stage(StageSpec {
            api_id: "a1".to_string(),
            stage_name: "prod".to_string(),
            deployment_id: "d1".to_string(),
        }));

        let provider = InMemoryProvider::new();
        let err = assemble_endpoint(&provider, &plan, &WaitConfig::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Validation(_)));
        assert!(provider.calls().await.is_empty());
    }

    #[test]
    fn for_function_interleaves_methods_and_integrations() {
        let plan = plan();
        let kinds: Vec<ResourceKind> = plan.steps.iter().map(|s| s.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ResourceKind::Method,
                ResourceKind::Integration,
                ResourceKind::Method,
                ResourceKind::Integration,
            ]
        );
    }
}
