//! In-Memory Provider Implementation
//!
//! Stores resources in memory behind `Arc<RwLock<>>` for thread safety.
//! Suitable for:
//! - Development and testing of converge flows without a cloud account
//! - Call-count and ordering assertions against the provider boundary
//! - Scripted async-status sequences for waiter behavior
//!
//! The backend reflects prior writes, so converging the same descriptor
//! twice exercises the real replace/update paths.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::descriptor::ResourceDescriptor;
use crate::provider::{Provider, ProviderError};
use crate::waiter::OperationStatus;

/// Provider operations, as recorded in the call log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOp {
    Exists,
    Create,
    Delete,
    BeginUpdate,
    Status,
    FinishUpdate,
    CreateDeployment,
    FinalizeApi,
}

impl fmt::Display for ProviderOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderOp::Exists => "exists",
            ProviderOp::Create => "create",
            ProviderOp::Delete => "delete",
            ProviderOp::BeginUpdate => "begin_update",
            ProviderOp::Status => "status",
            ProviderOp::FinishUpdate => "finish_update",
            ProviderOp::CreateDeployment => "create_deployment",
            ProviderOp::FinalizeApi => "finalize_api",
        };
        f.write_str(name)
    }
}

/// One recorded provider call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRecord {
    pub op: ProviderOp,
    pub identity: String,
}

/// In-memory provider backend
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    /// Resources by descriptor identity
    resources: Arc<RwLock<HashMap<String, ResourceDescriptor>>>,
    /// Every call made against this provider, in order
    calls: Arc<RwLock<Vec<CallRecord>>>,
    /// Injected failures by (operation, identity)
    failures: Arc<RwLock<HashSet<(ProviderOp, String)>>>,
    /// Scripted statuses consumed by `begin_update` and `operation_status`
    statuses: Arc<RwLock<VecDeque<OperationStatus>>>,
    /// Deployment id counter
    deployments: Arc<AtomicU64>,
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the full call log in call order
    pub async fn calls(&self) -> Vec<CallRecord> {
        self.calls.read().await.clone()
    }

    /// Number of recorded calls for one operation
    pub async fn call_count(&self, op: ProviderOp) -> usize {
        self.calls.read().await.iter().filter(|c| c.op == op).count()
    }

    /// Whether a resource with the given identity currently exists
    pub async fn contains(&self, identity: &str) -> bool {
        self.resources.read().await.contains_key(identity)
    }

    /// Stored descriptor for an identity, if present
    pub async fn stored(&self, identity: &str) -> Option<ResourceDescriptor> {
        self.resources.read().await.get(identity).cloned()
    }

    /// Make every subsequent `op` call against `identity` fail
    pub async fn fail_on(&self, op: ProviderOp, identity: &str) {
        self.failures
            .write()
            .await
            .insert((op, identity.to_string()));
    }

    /// Drop all injected failures
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Queue statuses for `begin_update` and `operation_status` to report in
    /// order; once drained both report `Succeeded`
    pub async fn script_statuses(&self, statuses: impl IntoIterator<Item = OperationStatus>) {
        self.statuses.write().await.extend(statuses);
    }

    /// Seed a resource as pre-existing without going through `create`
    pub async fn seed(&self, descriptor: ResourceDescriptor) {
        self.resources
            .write()
            .await
            .insert(descriptor.identity(), descriptor);
    }

    async fn record(&self, op: ProviderOp, identity: &str) -> Result<(), ProviderError> {
        debug!(%op, %identity, "in-memory provider call");
        self.calls.write().await.push(CallRecord {
            op,
            identity: identity.to_string(),
        });
        if self
            .failures
            .read()
            .await
            .contains(&(op, identity.to_string()))
        {
            return Err(ProviderError::Failure(format!(
                "injected {op} failure for {identity}"
            )));
        }
        Ok(())
    }

    async fn next_status(&self) -> OperationStatus {
        self.statuses
            .write()
            .await
            .pop_front()
            .unwrap_or(OperationStatus::Succeeded)
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn exists(&self, descriptor: &ResourceDescriptor) -> Result<bool, ProviderError> {
        let identity = descriptor.identity();
        self.record(ProviderOp::Exists, &identity).await?;
        Ok(self.resources.read().await.contains_key(&identity))
    }

    async fn create(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError> {
        let identity = descriptor.identity();
        self.record(ProviderOp::Create, &identity).await?;
        self.resources
            .write()
            .await
            .insert(identity, descriptor.clone());
        Ok(())
    }

    async fn delete(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError> {
        let identity = descriptor.identity();
        self.record(ProviderOp::Delete, &identity).await?;
        if self.resources.write().await.remove(&identity).is_none() {
            return Err(ProviderError::NotFound(identity));
        }
        Ok(())
    }

    async fn begin_update(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<OperationStatus, ProviderError> {
        let identity = descriptor.identity();
        self.record(ProviderOp::BeginUpdate, &identity).await?;
        if !self.resources.read().await.contains_key(&identity) {
            return Err(ProviderError::NotFound(identity));
        }
        // The new definition lands even though the status may lag behind.
        self.resources
            .write()
            .await
            .insert(identity, descriptor.clone());
        Ok(self.next_status().await)
    }

    async fn operation_status(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> Result<OperationStatus, ProviderError> {
        let identity = descriptor.identity();
        self.record(ProviderOp::Status, &identity).await?;
        Ok(self.next_status().await)
    }

    async fn finish_update(&self, descriptor: &ResourceDescriptor) -> Result<(), ProviderError> {
        let identity = descriptor.identity();
        self.record(ProviderOp::FinishUpdate, &identity).await?;
        if !self.resources.read().await.contains_key(&identity) {
            return Err(ProviderError::NotFound(identity));
        }
        Ok(())
    }

    async fn create_deployment(&self, api_id: &str) -> Result<String, ProviderError> {
        self.record(ProviderOp::CreateDeployment, api_id).await?;
        let n = self.deployments.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("deployment-{n}"))
    }

    async fn finalize_api(&self, api_id: &str) -> Result<(), ProviderError> {
        self.record(ProviderOp::FinalizeApi, api_id).await?;
        Ok(())
    }
}
