//! # AWS Provisioning Capability
//!
//! **AWS implementation of the skylift provider, plus the deployment
//! helpers around it.**
//!
//! [`AwsProvider`] drives API Gateway and Lambda through the
//! [`Provider`](skylift_provision::Provider) capability; the surrounding
//! modules resolve names to ids, grant invoke permissions, load deployment
//! descriptors from S3, and open database connections from Secrets Manager
//! logins. Clients are built once from an explicit
//! [`SdkConfig`](aws_config::SdkConfig) and passed by handle.
//!
//! ```rust,no_run
//! use skylift_aws::AwsProvider;
//! use skylift_provision::prelude::*;
//!
//! # async fn example(descriptor: ResourceDescriptor) -> Result<()> {
//! let provider = AwsProvider::from_env().await;
//! let outcome = Converger::new(&provider).converge(&descriptor).await?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod env;
pub mod gateway;
pub mod identity;
pub mod object_store;
pub mod prelude;
pub mod provider;
pub mod secrets;

// Re-export for convenience
pub use database::{connect, connect_from_env};
pub use env::{DbParams, require_env};
pub use gateway::{find_resource_id, find_rest_api_id, invocation_uri};
pub use identity::account_id;
pub use object_store::{fetch_deploy_spec, fetch_yaml};
pub use provider::AwsProvider;
pub use secrets::{DbLogin, fetch_db_login};
