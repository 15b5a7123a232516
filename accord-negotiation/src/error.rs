//! Error type for the Negotiation Engine, wrapping the domain, storage,
//! and shared-context errors it can surface (the latter via the optional
//! §4.5 cross-component hook that writes an agreement into a Context).

use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("{0}")]
    Core(#[from] accord_core::Error),

    #[error("{0}")]
    Storage(#[from] accord_storage::Error),

    #[error("{0}")]
    Context(#[from] accord_context::Error),
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
            Error::Context(e) => e.retryable(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
