//! Errors raised by course store collaborators

use std::fmt;
use thiserror::Error;

/// Kind of record a lookup failed to find
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Course,
    Section,
    Item,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Course => "course",
            Self::Section => "section",
            Self::Item => "course module",
        };
        f.write_str(name)
    }
}

/// Errors from a course repository or structure primitive
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: u64 },

    /// Failure inside the storage backend
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    #[must_use]
    pub const fn not_found(entity: Entity, id: u64) -> Self {
        Self::NotFound { entity, id }
    }
}

/// Failure of the clone primitive for a single item
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CloneError(pub String);

impl From<StoreError> for CloneError {
    fn from(err: StoreError) -> Self {
        Self(err.to_string())
    }
}

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
