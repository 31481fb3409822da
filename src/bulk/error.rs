//! Errors that reject a whole bulk action
//!
//! Failures of single items during duplication or deletion are not errors
//! at this level; they are recorded in the batch outcome instead.

use thiserror::Error;

use crate::auth::Capability;
use crate::course::{CourseId, Entity, SectionNum, StoreError};

/// Batch-level failures of a bulk action
#[derive(Debug, Error)]
pub enum BulkError {
    /// Malformed request
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Referenced course, section or module is absent
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: u64 },

    /// The acting user lacks a capability
    #[error("Missing capability {capability} in course {course}")]
    Authorization {
        capability: Capability,
        course: CourseId,
    },

    /// A policy listener excluded the section
    #[error("Section {section} of course {course} is restricted")]
    RestrictedSection {
        course: CourseId,
        section: SectionNum,
    },

    /// A policy listener forbade keeping original section numbers
    #[error("Keeping original section numbers is restricted in course {course}")]
    OriginSectionRestricted { course: CourseId },

    /// Sections would have to be created but that is not possible
    #[error("Cannot provide section {requested} in course {course}: {reason}")]
    Capacity {
        course: CourseId,
        requested: SectionNum,
        reason: String,
    },

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Store(String),
}

impl BulkError {
    #[must_use]
    pub const fn not_found(entity: Entity, id: u64) -> Self {
        Self::NotFound { entity, id }
    }
}

impl From<StoreError> for BulkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

/// Result type for bulk actions
pub type BulkResult<T> = std::result::Result<T, BulkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_keeps_entity() {
        let err: BulkError = StoreError::not_found(Entity::Section, 4).into();
        assert!(matches!(
            err,
            BulkError::NotFound {
                entity: Entity::Section,
                id: 4
            }
        ));
        assert_eq!(err.to_string(), "section not found: 4");
    }

    #[test]
    fn test_authorization_message_names_capability() {
        let err = BulkError::Authorization {
            capability: Capability::RestoreTargetImport,
            course: 3,
        };
        assert_eq!(
            err.to_string(),
            "Missing capability moodle/restore:restoretargetimport in course 3"
        );
    }
}
