//! Shared error taxonomy for the coordination engine
//!
//! Every component (entity store, shared context, team formation,
//! negotiation) surfaces failures through this single enum rather than
//! component-local error types, so callers can match on kind once.

use thiserror::Error;

/// Core error type shared by every engine in the workspace
#[derive(Error, Debug)]
pub enum Error {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("invalid state: {message}")]
    InvalidState { message: String },

    #[error("stale version: expected {expected}, found {found}")]
    StaleVersion { expected: String, found: String },

    #[error("no agents available")]
    NoAgentsAvailable,

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {message}")]
    Internal { message: String, retryable: bool },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Error::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Error::PermissionDenied {
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Error::InvalidState {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal_retryable(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
            retryable: true,
        }
    }

    /// Whether a caller may usefully retry this exact operation
    pub fn retryable(&self) -> bool {
        matches!(self, Error::StaleVersion { .. })
            || matches!(self, Error::Internal { retryable: true, .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied { .. })
    }
}

/// Convenience result type used throughout the workspace
pub type Result<T> = std::result::Result<T, Error>;
