//! AWS provider implementation
//!
//! Implements the [`Provider`] capability over API Gateway and Lambda. The
//! handle owns its SDK clients, built once from an [`SdkConfig`]; nothing is
//! read from ambient globals after construction. "Not found" responses are
//! recognized through the SDK's typed error predicates and reported as
//! normal absence, never inferred from error text.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_apigateway::types::IntegrationType;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::types::{Architecture, FunctionCode, LastUpdateStatus, Runtime};
use tracing::{debug, info};

use skylift_provision::{
    FunctionSpec, IntegrationSpec, MethodSpec, OperationStatus, Provider, ProviderError,
    ProvisionError, ResourceDescriptor, Result, RestResourceSpec, StageSpec,
};

/// Provider backed by AWS API Gateway and Lambda
#[derive(Debug, Clone)]
pub struct AwsProvider {
    gateway: aws_sdk_apigateway::Client,
    lambda: aws_sdk_lambda::Client,
}

impl AwsProvider {
    /// Build a provider from an already-loaded SDK configuration
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            gateway: aws_sdk_apigateway::Client::new(config),
            lambda: aws_sdk_lambda::Client::new(config),
        }
    }

    /// Build a provider from the default credential and region chain
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(&config)
    }

    pub(crate) fn gateway(&self) -> &aws_sdk_apigateway::Client {
        &self.gateway
    }

    /// Grant API Gateway permission to invoke a function for one method.
    ///
    /// The statement id is deterministic per (method, function), so granting
    /// again after a redeploy conflicts instead of accumulating duplicates;
    /// the provider reports that conflict and the caller may ignore it.
    pub async fn allow_gateway_invoke(
        &self,
        function_name: &str,
        http_method: &str,
        source_arn: &str,
    ) -> Result<()> {
        for (value, field) in [
            (function_name, "function name"),
            (http_method, "http method"),
            (source_arn, "source arn"),
        ] {
            if value.trim().is_empty() {
                return Err(ProvisionError::Validation(format!(
                    "{field} can not be empty"
                )));
            }
        }

        info!(%function_name, %http_method, "granting gateway invoke permission");
        self.lambda
            .add_permission()
            .action("lambda:InvokeFunction")
            .function_name(function_name)
            .principal("apigateway.amazonaws.com")
            .statement_id(invoke_statement_id(http_method, function_name))
            .source_arn(source_arn)
            .send()
            .await
            .map_err(|e| ProvisionError::Provider {
                operation: "add permission",
                identity: format!("function {function_name}"),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }

    async fn create_function(&self, spec: &FunctionSpec) -> std::result::Result<(), ProviderError> {
        self.lambda
            .create_function()
            .function_name(&spec.name)
            .role(&spec.role_arn)
            .handler(&spec.handler)
            .runtime(Runtime::from(spec.runtime.as_str()))
            .architectures(Architecture::from(spec.architecture.as_str()))
            .code(
                FunctionCode::builder()
                    .s3_bucket(&spec.code_bucket)
                    .s3_key(&spec.code_key)
                    .build(),
            )
            .publish(spec.publish)
            .send()
            .await
            .map(|_| ())
            .map_err(failure)
    }

    async fn create_rest_resource(
        &self,
        spec: &RestResourceSpec,
    ) -> std::result::Result<(), ProviderError> {
        self.gateway
            .create_resource()
            .rest_api_id(&spec.api_id)
            .parent_id(&spec.parent_id)
            .path_part(&spec.path_part)
            .send()
            .await
            .map(|_| ())
            .map_err(failure)
    }

    async fn put_method(&self, spec: &MethodSpec) -> std::result::Result<(), ProviderError> {
        self.gateway
            .put_method()
            .rest_api_id(&spec.api_id)
            .resource_id(&spec.resource_id)
            .http_method(&spec.http_method)
            .authorization_type("NONE")
            .api_key_required(spec.api_key_required)
            .send()
            .await
            .map(|_| ())
            .map_err(failure)
    }

    async fn put_integration(
        &self,
        spec: &IntegrationSpec,
    ) -> std::result::Result<(), ProviderError> {
        self.gateway
            .put_integration()
            .rest_api_id(&spec.api_id)
            .resource_id(&spec.resource_id)
            .http_method(&spec.http_method)
            .r#type(IntegrationType::AwsProxy)
            .integration_http_method("POST")
            .passthrough_behavior("WHEN_NO_MATCH")
            .uri(&spec.uri)
            .set_request_parameters(if spec.request_parameters.is_empty() {
                None
            } else {
                Some(spec.request_parameters.clone())
            })
            .send()
            .await
            .map(|_| ())
            .map_err(failure)
    }

    async fn create_stage(&self, spec: &StageSpec) -> std::result::Result<(), ProviderError> {
        self.gateway
            .create_stage()
            .rest_api_id(&spec.api_id)
            .stage_name(&spec.stage_name)
            .deployment_id(&spec.deployment_id)
            .send()
            .await
            .map(|_| ())
            .map_err(failure)
    }
}

#[async_trait]
impl Provider for AwsProvider {
    fn name(&self) -> &'static str {
        "aws"
    }

    async fn exists(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> std::result::Result<bool, ProviderError> {
        debug!(identity = %descriptor.identity(), "probing");
        match descriptor {
            ResourceDescriptor::Function(s) => {
                match self
                    .lambda
                    .get_function()
                    .function_name(&s.name)
                    .send()
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(err) => {
                        let service = err.into_service_error();
                        if service.is_resource_not_found_exception() {
                            Ok(false)
                        } else {
                            Err(failure(service))
                        }
                    }
                }
            }
            ResourceDescriptor::RestResource(s) => {
                match self
                    .gateway
                    .get_resource()
                    .rest_api_id(&s.api_id)
                    .resource_id(&s.parent_id)
                    .send()
                    .await
                {
                    Ok(_) => {}
                    Err(err) => {
                        let service = err.into_service_error();
                        return if service.is_not_found_exception() {
                            Err(ProviderError::Failure(format!(
                                "parent resource {} does not exist on api {}",
                                s.parent_id, s.api_id
                            )))
                        } else {
                            Err(failure(service))
                        };
                    }
                }
                // The parent exists; probe the path part itself.
                match crate::gateway::find_resource_id(self.gateway(), &s.api_id, &s.path_part)
                    .await
                {
                    Ok(found) => Ok(found.is_some()),
                    Err(err) => Err(ProviderError::Failure(err.to_string())),
                }
            }
            ResourceDescriptor::Method(s) => {
                match self
                    .gateway
                    .get_method()
                    .rest_api_id(&s.api_id)
                    .resource_id(&s.resource_id)
                    .http_method(&s.http_method)
                    .send()
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(err) => {
                        let service = err.into_service_error();
                        if service.is_not_found_exception() {
                            Ok(false)
                        } else {
                            Err(failure(service))
                        }
                    }
                }
            }
            ResourceDescriptor::Integration(s) => {
                match self
                    .gateway
                    .get_integration()
                    .rest_api_id(&s.api_id)
                    .resource_id(&s.resource_id)
                    .http_method(&s.http_method)
                    .send()
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(err) => {
                        let service = err.into_service_error();
                        if service.is_not_found_exception() {
                            Ok(false)
                        } else {
                            Err(failure(service))
                        }
                    }
                }
            }
            ResourceDescriptor::Stage(s) => {
                match self
                    .gateway
                    .get_stage()
                    .rest_api_id(&s.api_id)
                    .stage_name(&s.stage_name)
                    .send()
                    .await
                {
                    Ok(_) => Ok(true),
                    Err(err) => {
                        let service = err.into_service_error();
                        if service.is_not_found_exception() {
                            Ok(false)
                        } else {
                            Err(failure(service))
                        }
                    }
                }
            }
        }
    }

    async fn create(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> std::result::Result<(), ProviderError> {
        info!(identity = %descriptor.identity(), "creating");
        match descriptor {
            ResourceDescriptor::Function(s) => self.create_function(s).await,
            ResourceDescriptor::RestResource(s) => self.create_rest_resource(s).await,
            ResourceDescriptor::Method(s) => self.put_method(s).await,
            ResourceDescriptor::Integration(s) => self.put_integration(s).await,
            ResourceDescriptor::Stage(s) => self.create_stage(s).await,
        }
    }

    async fn delete(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> std::result::Result<(), ProviderError> {
        info!(identity = %descriptor.identity(), "deleting");
        match descriptor {
            ResourceDescriptor::Method(s) => self
                .gateway
                .delete_method()
                .rest_api_id(&s.api_id)
                .resource_id(&s.resource_id)
                .http_method(&s.http_method)
                .send()
                .await
                .map(|_| ())
                .map_err(failure),
            ResourceDescriptor::Integration(s) => self
                .gateway
                .delete_integration()
                .rest_api_id(&s.api_id)
                .resource_id(&s.resource_id)
                .http_method(&s.http_method)
                .send()
                .await
                .map(|_| ())
                .map_err(failure),
            ResourceDescriptor::Function(s) => self
                .lambda
                .delete_function()
                .function_name(&s.name)
                .send()
                .await
                .map(|_| ())
                .map_err(failure),
            other => Err(ProviderError::Failure(format!(
                "delete is not supported for {}",
                other.kind()
            ))),
        }
    }

    async fn begin_update(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> std::result::Result<OperationStatus, ProviderError> {
        let ResourceDescriptor::Function(s) = descriptor else {
            return Err(ProviderError::Failure(format!(
                "in-place update is not supported for {}",
                descriptor.kind()
            )));
        };

        info!(function = %s.name, "updating function code");
        let output = self
            .lambda
            .update_function_code()
            .function_name(&s.name)
            .s3_bucket(&s.code_bucket)
            .s3_key(&s.code_key)
            .architectures(Architecture::from(s.architecture.as_str()))
            .publish(s.publish)
            .dry_run(s.dry_run)
            .send()
            .await
            .map_err(failure)?;

        let status = update_status(output.last_update_status());
        debug!(function = %s.name, %status, "code update submitted");
        Ok(status)
    }

    async fn operation_status(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> std::result::Result<OperationStatus, ProviderError> {
        let ResourceDescriptor::Function(s) = descriptor else {
            return Err(ProviderError::Failure(format!(
                "no async operations exist for {}",
                descriptor.kind()
            )));
        };

        let output = self
            .lambda
            .get_function()
            .function_name(&s.name)
            .send()
            .await
            .map_err(failure)?;

        let status = update_status(output.configuration().and_then(|c| c.last_update_status()));
        debug!(function = %s.name, %status, "polled update status");
        Ok(status)
    }

    async fn finish_update(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> std::result::Result<(), ProviderError> {
        let ResourceDescriptor::Function(s) = descriptor else {
            return Err(ProviderError::Failure(format!(
                "in-place update is not supported for {}",
                descriptor.kind()
            )));
        };

        debug!(function = %s.name, "applying execution role configuration");
        self.lambda
            .update_function_configuration()
            .function_name(&s.name)
            .role(&s.role_arn)
            .send()
            .await
            .map(|_| ())
            .map_err(failure)
    }

    async fn create_deployment(&self, api_id: &str) -> std::result::Result<String, ProviderError> {
        info!(%api_id, "creating deployment");
        let output = self
            .gateway
            .create_deployment()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(failure)?;

        output
            .id()
            .map(str::to_owned)
            .ok_or_else(|| ProviderError::Failure("deployment created without an id".to_string()))
    }

    async fn finalize_api(&self, api_id: &str) -> std::result::Result<(), ProviderError> {
        info!(%api_id, "applying deployment to live configuration");
        self.gateway
            .update_rest_api()
            .rest_api_id(api_id)
            .send()
            .await
            .map(|_| ())
            .map_err(failure)
    }
}

/// Deterministic permission statement id for one (method, function) pair
fn invoke_statement_id(http_method: &str, function_name: &str) -> String {
    format!("allow-{}-{}", http_method.to_ascii_lowercase(), function_name)
}

/// Map the provider's code-update status onto the converge status model
fn update_status(last: Option<&LastUpdateStatus>) -> OperationStatus {
    match last {
        Some(LastUpdateStatus::InProgress) => OperationStatus::InProgress,
        Some(LastUpdateStatus::Successful) => OperationStatus::Succeeded,
        Some(LastUpdateStatus::Failed) => OperationStatus::Failed,
        _ => OperationStatus::Pending,
    }
}

fn failure<E: std::error::Error + 'static>(err: E) -> ProviderError {
    ProviderError::Failure(DisplayErrorContext(&err).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_status_covers_all_reported_states() {
        assert_eq!(
            update_status(Some(&LastUpdateStatus::InProgress)),
            OperationStatus::InProgress
        );
        assert_eq!(
            update_status(Some(&LastUpdateStatus::Successful)),
            OperationStatus::Succeeded
        );
        assert_eq!(
            update_status(Some(&LastUpdateStatus::Failed)),
            OperationStatus::Failed
        );
        assert_eq!(update_status(None), OperationStatus::Pending);
    }

    #[test]
    fn statement_ids_are_deterministic_per_method_and_function() {
        assert_eq!(invoke_statement_id("GET", "ingest"), "allow-get-ingest");
        assert_eq!(
            invoke_statement_id("GET", "ingest"),
            invoke_statement_id("GET", "ingest")
        );
        assert_ne!(
            invoke_statement_id("GET", "ingest"),
            invoke_statement_id("POST", "ingest")
        );
    }
}
