//! # Converge Engine for Serverless Provisioning
//!
//! **Provider-agnostic orchestration for bringing cloud resources to a
//! desired state.**
//!
//! Callers describe resources as immutable [`ResourceDescriptor`]s; the
//! [`Converger`] probes existence through an explicit [`Provider`] handle and
//! creates, replaces, or updates in place, the [`waiter`] turns asynchronous
//! provider mutations into bounded waits, and the [`assembler`] sequences a
//! whole REST endpoint's dependency chain. All state lives provider-side:
//! every entity here is built, used once, and discarded.
//!
//! ```toml
//! [dependencies]
//! skylift-provision = "0.1"
//! ```

mod error;
pub use error::{ProvisionError, Result};

pub mod assembler;
pub mod converge;
pub mod deploy;
pub mod descriptor;
pub mod in_memory;
pub mod prelude;
pub mod provider;
pub mod waiter;

// Re-export for convenience
pub use assembler::{AssemblyPhase, AssemblyReport, EndpointPlan, assemble_endpoint};
pub use converge::{Convergence, Converger};
pub use deploy::{DeploySpec, EndpointDef, MethodDef};
pub use descriptor::{
    ConvergeStrategy, FunctionSpec, IntegrationSpec, MethodBinding, MethodSpec,
    ResourceDescriptor, ResourceKind, RestResourceSpec, StageSpec,
};
pub use in_memory::{CallRecord, InMemoryProvider, ProviderOp};
pub use provider::{Provider, ProviderError};
pub use waiter::{OperationStatus, WaitConfig, await_completion};
