//! Error type for the Shared Context Engine.
//!
//! Mirrors the teacher's per-crate pattern: each layer wraps the errors of
//! the layers beneath it (here, the domain error and the storage error)
//! rather than reusing a lower crate's error type directly, so that a
//! `?` inside this crate's engine always resolves through a `From` impl
//! defined in this crate.

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("{0}")]
    Core(#[from] accord_core::Error),

    #[error("{0}")]
    Storage(#[from] accord_storage::Error),
}

impl Error {
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        accord_core::Error::not_found(entity_type, id).into()
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        accord_core::Error::permission_denied(message).into()
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        accord_core::Error::invalid_argument(message).into()
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        accord_core::Error::invalid_state(message).into()
    }

    pub fn retryable(&self) -> bool {
        match self {
            Error::Core(e) => e.retryable(),
            Error::Storage(e) => e.retryable(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Core(e) => e.is_not_found(),
            Error::Storage(accord_storage::Error::Core(e)) => e.is_not_found(),
            _ => false,
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        match self {
            Error::Core(e) => e.is_permission_denied(),
            Error::Storage(accord_storage::Error::Core(e)) => e.is_permission_denied(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
