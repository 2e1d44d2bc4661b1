//! Resource descriptors
//!
//! A descriptor is an immutable, fully-specified definition of one desired
//! resource. Callers build a fresh descriptor per converge attempt; nothing
//! in this crate mutates or caches one.

use std::collections::HashMap;
use std::fmt;

use crate::error::{ProvisionError, Result};

/// Desired state of a compute function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpec {
    /// Function name, unique per account and region
    pub name: String,
    /// Execution role ARN
    pub role_arn: String,
    /// Instruction set architecture (e.g. `arm64`, `x86_64`)
    pub architecture: String,
    /// Runtime identifier (e.g. `provided.al2023`)
    pub runtime: String,
    /// Entry point handler
    pub handler: String,
    /// Bucket holding the code archive
    pub code_bucket: String,
    /// Object key of the code archive
    pub code_key: String,
    /// Publish a new version on create/update
    pub publish: bool,
    /// Validate an update without applying it
    pub dry_run: bool,
}

/// Desired state of one REST resource path segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestResourceSpec {
    pub api_id: String,
    /// Resource the new path part hangs off
    pub parent_id: String,
    pub path_part: String,
}

/// Desired state of one REST method on a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    pub api_id: String,
    pub resource_id: String,
    /// HTTP method name (`GET`, `POST`, ...)
    pub http_method: String,
    pub api_key_required: bool,
}

/// Desired state of the function integration behind a REST method
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrationSpec {
    pub api_id: String,
    pub resource_id: String,
    pub http_method: String,
    /// Invocation URI of the backing function
    pub uri: String,
    /// Request parameter mappings passed through to the integration
    pub request_parameters: HashMap<String, String>,
}

/// Desired state of a deployment stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub api_id: String,
    pub stage_name: String,
    /// Deployment the stage points at when created
    pub deployment_id: String,
}

/// One HTTP method bound to a function integration, used when building an
/// [`EndpointPlan`](crate::assembler::EndpointPlan)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodBinding {
    pub name: String,
    pub request_parameters: HashMap<String, String>,
}

impl MethodBinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            request_parameters: HashMap::new(),
        }
    }
}

/// Identifies a target resource to converge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceDescriptor {
    Function(FunctionSpec),
    RestResource(RestResourceSpec),
    Method(MethodSpec),
    Integration(IntegrationSpec),
    Stage(StageSpec),
}

/// Resource kind tag, used for strategy dispatch and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Function,
    RestResource,
    Method,
    Integration,
    Stage,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Function => "function",
            ResourceKind::RestResource => "resource",
            ResourceKind::Method => "method",
            ResourceKind::Integration => "integration",
            ResourceKind::Stage => "stage",
        };
        f.write_str(name)
    }
}

/// How `converge` reconciles a resource that already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergeStrategy {
    /// Create if absent, otherwise leave untouched
    CreateOnly,
    /// Delete the existing resource, then create fresh from the descriptor
    Replace,
    /// Issue an in-place update; identity (ARN, permissions) survives
    UpdateInPlace,
}

impl ResourceKind {
    /// Partial-update semantics are inconsistent across the gateway resource
    /// kinds, so methods and integrations are replaced wholesale. Functions
    /// must keep their identity and are updated in place.
    pub fn strategy(self) -> ConvergeStrategy {
        match self {
            ResourceKind::RestResource | ResourceKind::Stage => ConvergeStrategy::CreateOnly,
            ResourceKind::Method | ResourceKind::Integration => ConvergeStrategy::Replace,
            ResourceKind::Function => ConvergeStrategy::UpdateInPlace,
        }
    }
}

impl ResourceDescriptor {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceDescriptor::Function(_) => ResourceKind::Function,
            ResourceDescriptor::RestResource(_) => ResourceKind::RestResource,
            ResourceDescriptor::Method(_) => ResourceKind::Method,
            ResourceDescriptor::Integration(_) => ResourceKind::Integration,
            ResourceDescriptor::Stage(_) => ResourceKind::Stage,
        }
    }

    /// Stable human-readable identity, used as the provider key in the
    /// in-memory backend and in every log line and error
    pub fn identity(&self) -> String {
        match self {
            ResourceDescriptor::Function(s) => format!("function {}", s.name),
            ResourceDescriptor::RestResource(s) => {
                format!("resource {}/{}", s.api_id, s.path_part)
            }
            ResourceDescriptor::Method(s) => {
                format!("method {} on {}/{}", s.http_method, s.api_id, s.resource_id)
            }
            ResourceDescriptor::Integration(s) => format!(
                "integration {} on {}/{}",
                s.http_method, s.api_id, s.resource_id
            ),
            ResourceDescriptor::Stage(s) => format!("stage {} on {}", s.stage_name, s.api_id),
        }
    }

    /// Fail-fast input validation, run before any provider call
    pub fn validate(&self) -> Result<()> {
        match self {
            ResourceDescriptor::Function(s) => {
                require(&s.name, "function name")?;
                require(&s.role_arn, "function role ARN")?;
                require(&s.runtime, "function runtime")?;
                require(&s.handler, "function handler")?;
                require(&s.code_bucket, "function code bucket")?;
                require(&s.code_key, "function code key")
            }
            ResourceDescriptor::RestResource(s) => {
                require(&s.api_id, "api id")?;
                require(&s.parent_id, "parent resource id")?;
                require(&s.path_part, "resource path part")
            }
            ResourceDescriptor::Method(s) => {
                require(&s.api_id, "api id")?;
                require(&s.resource_id, "resource id")?;
                require(&s.http_method, "http method")
            }
            ResourceDescriptor::Integration(s) => {
                require(&s.api_id, "api id")?;
                require(&s.resource_id, "resource id")?;
                require(&s.http_method, "http method")?;
                require(&s.uri, "integration uri")
            }
            ResourceDescriptor::Stage(s) => {
                require(&s.api_id, "api id")?;
                require(&s.stage_name, "stage name")?;
                require(&s.deployment_id, "deployment id")
            }
        }
    }
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProvisionError::Validation(format!(
            "{field} can not be empty"
        )));
    }
    Ok(())
}
