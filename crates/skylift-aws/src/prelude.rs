//! # AWS Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use skylift_aws::prelude::*;
//! ```

pub use crate::database::{connect, connect_from_env};
pub use crate::env::{DbParams, require_env};
pub use crate::gateway::{find_resource_id, find_rest_api_id, invocation_uri};
pub use crate::identity::account_id;
pub use crate::object_store::{fetch_deploy_spec, fetch_yaml};
pub use crate::provider::AwsProvider;
pub use crate::secrets::{DbLogin, fetch_db_login};

// Core converge types come along for callers of this crate
pub use skylift_provision::prelude::*;
