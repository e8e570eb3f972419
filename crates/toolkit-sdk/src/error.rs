//! Error types for the toolkit SDK

use thiserror::Error;

use crate::types::Slot;
use crate::validation::PortViolation;

/// Result type alias using SdkError
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors that can occur while declaring, resolving, or running a node
#[derive(Debug, Error)]
pub enum SdkError {
    /// The model's JSON Schema cannot be normalized
    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    /// A `$ref`/`allOf` target is missing or an array item type is indeterminate
    #[error("Schema resolution error: {0}")]
    SchemaResolution(String),

    /// A field violates a metadata constraint (e.g. array without items)
    #[error("Field '{field}' violates a constraint: {reason}")]
    FieldConstraint { field: String, reason: String },

    /// Build-time port gate failure
    #[error(transparent)]
    Port(#[from] PortViolation),

    /// Request body does not satisfy the declared inputs/params model
    #[error("Invalid {slot}: {message}")]
    Validation { slot: Slot, message: String },

    /// The node's execute callback failed
    #[error("Execution failed: {0}")]
    Execution(String),

    /// The node's startup hook failed
    #[error("Startup failed: {0}")]
    Startup(String),

    /// No node registered under this name
    #[error("Node '{0}' not found")]
    UnknownNode(String),

    /// No callback registered under this id
    #[error("Callback '{0}' not found")]
    UnknownCallback(String),

    /// A field name does not exist in the given slot
    #[error("Field '{field}' not found in {slot}")]
    UnknownField { slot: Slot, field: String },

    /// Storage service returned an error
    #[error("Storage error: {0}")]
    Storage(String),

    /// A storage object name is not `<uuid>.<ext>` with an allowed extension
    #[error("Invalid object name '{name}': {reason}")]
    InvalidObjectName { name: String, reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl SdkError {
    /// Create an execution failed error with a message
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Create a startup failed error with a message
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaValidation(msg.into())
    }

    pub(crate) fn resolution(msg: impl Into<String>) -> Self {
        Self::SchemaResolution(msg.into())
    }

    /// Whether the error was raised while registering a node.
    ///
    /// These abort node startup; everything else is reported per request.
    pub fn is_registration_error(&self) -> bool {
        matches!(
            self,
            Self::SchemaValidation(_)
                | Self::SchemaResolution(_)
                | Self::FieldConstraint { .. }
                | Self::Port(_)
        )
    }
}
