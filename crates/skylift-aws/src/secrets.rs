//! Database login retrieval
//!
//! The database login lives in Secrets Manager as a JSON payload with
//! `username` and `password` fields. The payload and the password are never
//! logged; `DbLogin`'s `Debug` impl masks the password so it cannot leak
//! through error or trace formatting.

use std::fmt;

use aws_config::SdkConfig;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde::Deserialize;
use tracing::{debug, info};

use skylift_provision::{ProvisionError, Result};

/// Structured database login from the secret store
#[derive(Clone, Deserialize)]
pub struct DbLogin {
    #[serde(default)]
    pub username: String,
    pub password: String,
}

impl fmt::Debug for DbLogin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbLogin")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Fetch the current database login from the secret store
pub async fn fetch_db_login(config: &SdkConfig, secret_id: &str) -> Result<DbLogin> {
    if secret_id.trim().is_empty() {
        return Err(ProvisionError::Validation(
            "secret id can not be empty".into(),
        ));
    }

    debug!(%secret_id, "retrieving database login");
    let client = aws_sdk_secretsmanager::Client::new(config);
    let output = client
        .get_secret_value()
        .secret_id(secret_id)
        .version_stage("AWSCURRENT")
        .send()
        .await
        .map_err(|e| ProvisionError::Provider {
            operation: "get secret value",
            identity: format!("secret {secret_id}"),
            message: DisplayErrorContext(&e).to_string(),
        })?;

    let payload = output.secret_string().ok_or_else(|| {
        ProvisionError::Configuration(format!("secret {secret_id} has no string payload"))
    })?;

    let login = parse_login(payload)?;
    info!(%secret_id, username = %login.username, "database login retrieved");
    Ok(login)
}

fn parse_login(payload: &str) -> Result<DbLogin> {
    serde_json::from_str(payload).map_err(|e| {
        // Never echo the payload into the error.
        ProvisionError::Serialization(format!("secret payload is not a login object: {e}"))
    })
}
