//! Provider capability trait
//!
//! Every operation in this crate takes an explicit provider handle; there is
//! no ambient client configuration. Any backend reachable through this
//! interface is usable: the AWS implementation lives in `skylift-aws`, and
//! [`InMemoryProvider`](crate::in_memory::InMemoryProvider) backs development
//! and tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::descriptor::ResourceDescriptor;
use crate::waiter::OperationStatus;

/// Error type at the provider boundary.
///
/// `NotFound` is a distinct variant rather than a failure shape to sniff:
/// probes treat it as normal absence, never as a hard error.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("provider failure: {0}")]
    Failure(String),
}

/// Capability interface over the external provisioning API.
///
/// Implementations hold their own clients and sessions; the trait carries no
/// state between calls and all durable state lives provider-side.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;

    /// Read-only existence probe. A provider-level "not found" response maps
    /// to `Ok(false)`; only genuine failures (auth, throttling, malformed
    /// request) surface as errors.
    async fn exists(&self, descriptor: &ResourceDescriptor) -> Result<bool, ProviderError>;

    /// Create the resource from the descriptor's full field set
    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError>;

    /// Delete the resource named by the descriptor's identity fields
    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError>;

    /// Issue an asynchronous in-place update and report the provider's
    /// initial status for it
    async fn begin_update(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<OperationStatus, ProviderError>;

    /// Poll the status of the in-flight update for the descriptor
    async fn operation_status(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<OperationStatus, ProviderError>;

    /// Apply post-update settings once the update has succeeded (for
    /// functions, the execution role configuration)
    async fn finish_update(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError>;

    /// Snapshot the current API configuration into a new deployment and
    /// return its id
    async fn create_deployment(&self, api_id: &str) -> Result<String, ProviderError>;

    /// Apply the deployment outcome to the live API configuration
    async fn finalize_api(&self, api_id: &str) -> Result<(), ProviderError>;
}
