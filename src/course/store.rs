//! Collaborator traits for the live course structure
//!
//! The bulk engine never owns course records. It reads and mutates them
//! through these traits and re-reads at defined checkpoints, so every
//! implementation must return current state on each call.

use super::error::{CloneError, StoreError, StoreResult};
use super::types::{
    CacheScope, Course, CourseId, FormatOptions, Item, ItemChanges, ItemId, Section, SectionNum,
};

/// Persistent storage of courses, sections and items
pub trait CourseRepository {
    /// Fetch a course record
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the course does not exist.
    fn course(&self, id: CourseId) -> StoreResult<Course>;

    /// Fetch the live section list of a course, ordered by section number
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the course does not exist.
    fn sections(&self, course: CourseId) -> StoreResult<Vec<Section>>;

    /// Append one empty section and return its number
    ///
    /// # Errors
    /// Returns `StoreError` if the course does not exist or cannot be written.
    fn create_section(&self, course: CourseId) -> StoreResult<SectionNum>;

    /// Replace the course format options
    ///
    /// # Errors
    /// Returns `StoreError` if the course does not exist or cannot be written.
    fn update_format_options(&self, course: CourseId, options: &FormatOptions) -> StoreResult<()>;

    /// Fetch an item record
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the item does not exist.
    fn item(&self, id: ItemId) -> StoreResult<Item>;

    /// Apply field changes to an item
    ///
    /// # Errors
    /// Returns `StoreError` if the item does not exist or cannot be written.
    fn update_item(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<()>;

    /// Delete an item and remove it from its section
    ///
    /// # Errors
    /// Returns `StoreError` if the item does not exist or cannot be removed.
    fn delete_item(&self, id: ItemId) -> StoreResult<()>;

    /// Rebuild cached course structure for the given scope
    ///
    /// # Errors
    /// Returns `StoreError` if the course does not exist.
    fn invalidate_cache(&self, course: CourseId, scope: CacheScope) -> StoreResult<()>;

    /// Check whether a course exists
    ///
    /// # Errors
    /// Returns `StoreError::Backend` if the lookup itself fails.
    fn course_exists(&self, id: CourseId) -> StoreResult<bool> {
        match self.course(id) {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Module duplication primitive
pub trait ItemCloner {
    /// Duplicate `source` into `target` and return the new item id.
    ///
    /// Within the same course the copy is placed right after its source.
    /// Into another course it lands in the section with the same number, or
    /// the last section when that number does not exist there.
    ///
    /// # Errors
    /// Returns `CloneError` if the item cannot be duplicated.
    fn clone_item(&self, source: &Item, target: CourseId) -> Result<ItemId, CloneError>;
}

/// Module relocation primitive
pub trait ItemRelocator {
    /// Move an item to the end of a section of its own course
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the item or section does not exist.
    fn relocate(&self, item: ItemId, section: SectionNum) -> StoreResult<()>;
}
