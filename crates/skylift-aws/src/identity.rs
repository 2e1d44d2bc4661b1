//! Account identity

use aws_config::SdkConfig;
use aws_sdk_sts::error::DisplayErrorContext;
use tracing::debug;

use skylift_provision::{ProvisionError, Result};

/// Resolve the account id of the active credentials
pub async fn account_id(config: &SdkConfig) -> Result<String> {
    debug!("resolving caller account id");
    let client = aws_sdk_sts::Client::new(config);
    let output = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| ProvisionError::Provider {
            operation: "get caller identity",
            identity: "caller".to_string(),
            message: DisplayErrorContext(&e).to_string(),
        })?;

    output
        .account()
        .map(str::to_owned)
        .ok_or_else(|| ProvisionError::Configuration("caller identity has no account id".into()))
}
