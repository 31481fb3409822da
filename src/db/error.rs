//! Database-specific error types
//!
//! - **`SledError`**: errors from the underlying sled embedded database
//! - **`DecodeError`** / **`EncodeError`**: bincode failures on stored records
//! - **`JsonError`**: event payloads that cannot be written or read back
//! - **`CorruptKey`**: a tree key that is not an 8-byte id

use thiserror::Error;

use crate::course::{Entity, StoreError};

/// Database-specific errors
#[derive(Debug, Error)]
pub enum DbError {
    /// Represents a sled database error
    #[error("Database error: {0}")]
    SledError(#[from] sled::Error),

    /// Represents a bincode decoding error
    #[error("Error while decoding data: {0}")]
    DecodeError(#[from] bincode::error::DecodeError),

    /// Represents a bincode encoding error
    #[error("Error while encoding data: {0}")]
    EncodeError(#[from] bincode::error::EncodeError),

    /// Event payload (de)serialization error
    #[error("Error while handling event payload: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Key of unexpected length in one of the trees
    #[error("Corrupt key of {0} bytes")]
    CorruptKey(usize),

    /// Referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: u64 },

    /// Invalid input provided (e.g. an unknown section number)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Backend(other.to_string()),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
