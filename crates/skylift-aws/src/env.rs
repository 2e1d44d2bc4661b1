//! Environment-derived configuration
//!
//! All environment reads live here. Every required variable that is missing
//! or empty fails fast with a configuration error naming the variable,
//! before anything touches the network.

use tracing::debug;

use skylift_provision::{ProvisionError, Result};

pub const ENV_DB_HOST: &str = "SKYLIFT_DB_HOST";
pub const ENV_DB_PORT: &str = "SKYLIFT_DB_PORT";
pub const ENV_DB_NAME: &str = "SKYLIFT_DB_NAME";
pub const ENV_DB_USER: &str = "SKYLIFT_DB_USER";
pub const ENV_DB_SECRET_ID: &str = "SKYLIFT_DB_SECRET_ID";
pub const ENV_REGION: &str = "AWS_REGION";

/// Read a required environment variable
pub fn require_env(name: &str) -> Result<String> {
    debug!(%name, "reading environment variable");
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ProvisionError::Configuration(format!("missing environment variable: {name}")))
}

/// Database connection parameters from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbParams {
    pub host: String,
    pub port: String,
    pub database: String,
    pub region: String,
    /// Fallback username; the secret's username takes precedence when set
    pub username: String,
    /// Secret id holding the database login
    pub secret_id: String,
}

impl DbParams {
    pub fn from_env() -> Result<Self> {
        let params = Self {
            host: require_env(ENV_DB_HOST)?,
            port: require_env(ENV_DB_PORT)?,
            database: require_env(ENV_DB_NAME)?,
            region: require_env(ENV_REGION)?,
            username: require_env(ENV_DB_USER)?,
            secret_id: require_env(ENV_DB_SECRET_ID)?,
        };
        if params.port.parse::<u16>().is_err() {
            return Err(ProvisionError::Configuration(format!(
                "{ENV_DB_PORT} must be a port number, got {:?}",
                params.port
            )));
        }
        Ok(params)
    }
}
