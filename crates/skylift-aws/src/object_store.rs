//! Descriptor loading from S3
//!
//! Deployment descriptors are YAML objects in a blob store. `fetch_yaml`
//! retrieves one object and deserializes it into any `serde` type; the
//! typed wrappers below name the descriptors this system actually uses.

use aws_config::SdkConfig;
use aws_sdk_s3::error::DisplayErrorContext;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use skylift_provision::{DeploySpec, ProvisionError, Result};

/// Fetch an S3 object and parse it as YAML
pub async fn fetch_yaml<T: DeserializeOwned>(
    config: &SdkConfig,
    bucket: &str,
    key: &str,
) -> Result<T> {
    if bucket.trim().is_empty() {
        return Err(ProvisionError::Validation("bucket can not be empty".into()));
    }
    if key.trim().is_empty() {
        return Err(ProvisionError::Validation(
            "object key can not be empty".into(),
        ));
    }

    debug!(%bucket, %key, "retrieving descriptor object");
    let client = aws_sdk_s3::Client::new(config);
    let output = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| ProvisionError::Provider {
            operation: "get object",
            identity: format!("{bucket}/{key}"),
            message: DisplayErrorContext(&e).to_string(),
        })?;

    let bytes = output
        .body
        .collect()
        .await
        .map_err(|e| ProvisionError::Provider {
            operation: "read object body",
            identity: format!("{bucket}/{key}"),
            message: e.to_string(),
        })?
        .into_bytes();

    if bytes.is_empty() {
        return Err(ProvisionError::Configuration(format!(
            "object {bucket}/{key} is empty"
        )));
    }

    info!(%bucket, %key, size = bytes.len(), "descriptor retrieved");
    serde_yml::from_slice(&bytes).map_err(|e| ProvisionError::Serialization(e.to_string()))
}

/// Fetch and validate a deployment descriptor
pub async fn fetch_deploy_spec(config: &SdkConfig, bucket: &str, key: &str) -> Result<DeploySpec> {
    let spec: DeploySpec = fetch_yaml(config, bucket, key).await?;
    spec.validate()?;
    Ok(spec)
}
