//! REST API lookups
//!
//! Deployment descriptors name APIs and resources; the gateway only deals in
//! ids. These helpers resolve names to ids by scanning the account's REST
//! APIs and an API's resources. Absence is `Ok(None)`, not an error.

use aws_sdk_apigateway::Client;
use aws_sdk_apigateway::error::DisplayErrorContext;
use tracing::{debug, info};

use skylift_provision::{ProvisionError, Result};

/// Resolve a REST API id from its configured name (case-insensitive)
pub async fn find_rest_api_id(client: &Client, name: &str) -> Result<Option<String>> {
    if name.trim().is_empty() {
        return Err(ProvisionError::Validation(
            "api name can not be empty".into(),
        ));
    }

    debug!(%name, "looking for a REST api by name");
    let mut pages = client.get_rest_apis().into_paginator().items().send();
    while let Some(item) = pages.next().await {
        let api = item.map_err(|e| ProvisionError::Provider {
            operation: "list apis",
            identity: format!("api {name}"),
            message: DisplayErrorContext(&e).to_string(),
        })?;
        if api.name().is_some_and(|n| n.eq_ignore_ascii_case(name)) {
            info!(%name, id = ?api.id(), "found REST api");
            return Ok(api.id().map(str::to_owned));
        }
    }

    debug!(%name, "no REST api with that name");
    Ok(None)
}

/// Resolve a resource id from its path part within one API (case-sensitive,
/// matching how the gateway stores path parts)
pub async fn find_resource_id(
    client: &Client,
    api_id: &str,
    path_part: &str,
) -> Result<Option<String>> {
    if api_id.trim().is_empty() {
        return Err(ProvisionError::Validation("api id can not be empty".into()));
    }
    if path_part.trim().is_empty() {
        return Err(ProvisionError::Validation(
            "resource path part can not be empty".into(),
        ));
    }

    debug!(%api_id, %path_part, "looking for a resource by path part");
    let mut pages = client
        .get_resources()
        .rest_api_id(api_id)
        .into_paginator()
        .items()
        .send();
    while let Some(item) = pages.next().await {
        let resource = item.map_err(|e| ProvisionError::Provider {
            operation: "list resources",
            identity: format!("api {api_id}"),
            message: DisplayErrorContext(&e).to_string(),
        })?;
        if resource.path_part() == Some(path_part) {
            info!(%api_id, %path_part, id = ?resource.id(), "found resource");
            return Ok(resource.id().map(str::to_owned));
        }
    }

    debug!(%api_id, %path_part, "no resource with that path part");
    Ok(None)
}

/// Invocation URI binding a gateway integration to a function, parameterized
/// by region and account instead of hard-coded values
pub fn invocation_uri(region: &str, account_id: &str, function_name: &str) -> String {
    format!(
        "arn:aws:apigateway:{region}:lambda:path/2015-03-31/functions/\
         arn:aws:lambda:{region}:{account_id}:function:{function_name}/invocations"
    )
}
