//! # Provision Prelude
//!
//! Convenient re-exports of the most commonly used types.
//!
//! ```rust
//! use skylift_provision::prelude::*;
//! ```

// Core types
pub use crate::descriptor::{
    ConvergeStrategy, FunctionSpec, IntegrationSpec, MethodBinding, MethodSpec,
    ResourceDescriptor, ResourceKind, RestResourceSpec, StageSpec,
};
pub use crate::error::{ProvisionError, Result};
pub use crate::provider::{Provider, ProviderError};

// Orchestration
pub use crate::assembler::{AssemblyReport, EndpointPlan, assemble_endpoint};
pub use crate::converge::{Convergence, Converger};
pub use crate::waiter::{OperationStatus, WaitConfig, await_completion};

// Descriptor parsing
pub use crate::deploy::{DeploySpec, EndpointDef, MethodDef};

// In-memory backend (development and testing)
pub use crate::in_memory::{CallRecord, InMemoryProvider, ProviderOp};
