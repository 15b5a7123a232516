//! Error type for the Team Formation Engine, wrapping the domain and
//! storage errors it can surface.

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

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        accord_core::Error::invalid_argument(message).into()
    }

    pub fn no_agents_available() -> Self {
        accord_core::Error::NoAgentsAvailable.into()
    }

    pub fn is_no_agents_available(&self) -> bool {
        matches!(self, Error::Core(accord_core::Error::NoAgentsAvailable))
    }

    pub fn retryable(&self) -> bool {
        match self {
            Error::Core(e) => e.retryable(),
            Error::Storage(e) => e.retryable(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
