//! Storage layer error type
//!
//! Mirrors the teacher's split between a domain-level error and a
//! storage-level error that wraps it: most failures here already have a
//! precise `accord_core::Error` variant, so this type exists mainly to let
//! the store talk about its own concerns (serialization, internal panics)
//! without forcing every caller through the core crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Core(#[from] accord_core::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal storage error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    pub fn retryable(&self) -> bool {
        match self {
            Error::Core(e) => e.retryable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
