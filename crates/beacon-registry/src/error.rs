//! Registry error types

use thiserror::Error;

/// Message returned for lookups and deregistrations of unknown broadcasters
pub const BROADCAST_NOT_FOUND: &str = "Broadcast not found";

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Malformed register input
    #[error("{0}")]
    Validation(String),

    /// Unknown broadcaster
    #[error("{0}")]
    NotFound(String),

    /// Unexpected failure inside the store
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RegistryError {
    pub fn broadcast_not_found() -> Self {
        RegistryError::NotFound(BROADCAST_NOT_FOUND.to_string())
    }
}

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
