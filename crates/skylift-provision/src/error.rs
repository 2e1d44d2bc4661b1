//! Error types for provisioning operations

use thiserror::Error;

use crate::waiter::OperationStatus;

/// Result type for provisioning operations
pub type Result<T> = std::result::Result<T, ProvisionError>;

/// Unified error type for all provisioning operations
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// A required input was missing or empty, caught before any provider call
    #[error("validation error: {0}")]
    Validation(String),

    /// The provider rejected or could not service a request
    #[error("provider failure during {operation} of {identity}: {message}")]
    Provider {
        operation: &'static str,
        identity: String,
        message: String,
    },

    /// An async operation did not reach a terminal state within budget
    #[error("{identity} still {last} after {budget_ms} ms; wait budget exhausted")]
    Timeout {
        identity: String,
        budget_ms: u64,
        last: OperationStatus,
    },

    /// The provider reported terminal failure for an async operation
    #[error("operation on {identity} reached terminal state {last}")]
    OperationFailed {
        identity: String,
        last: OperationStatus,
    },

    /// A replace sequence deleted the resource but failed to recreate it.
    /// Re-invoking `converge` with the same descriptor repairs the gap.
    #[error("replace left {identity} absent: delete succeeded but create failed: {message}")]
    Inconsistent { identity: String, message: String },

    /// Environment or deployment descriptor configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Payload could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Database connection error
    #[error("database error: {0}")]
    Database(String),
}

impl From<serde_json::Error> for ProvisionError {
    fn from(err: serde_json::Error) -> Self {
        ProvisionError::Serialization(err.to_string())
    }
}

impl From<serde_yml::Error> for ProvisionError {
    fn from(err: serde_yml::Error) -> Self {
        ProvisionError::Serialization(err.to_string())
    }
}
