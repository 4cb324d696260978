//! Host error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Resource already exists: {0}")]
    ResourceAlreadyExists(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Update not supported for {0}: change a replacing attribute or re-create the resource")]
    UpdateNotSupported(String),

    #[error("unexpected import identifier {id:?} for {resource_type}: expected {expected}")]
    InvalidImportId {
        resource_type: String,
        id: String,
        expected: String,
    },

    #[error("Unresolved reference: {0}")]
    UnresolvedReference(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
