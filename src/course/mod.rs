//! Course data model and the collaborator seams of the bulk engine

pub mod error;
pub mod store;
pub mod types;

pub use error::{CloneError, Entity, StoreError, StoreResult};
pub use store::{CourseRepository, ItemCloner, ItemRelocator};
pub use types::{
    CacheScope, Course, CourseId, FormatOptions, Item, ItemChanges, ItemId, MAX_INDENT, MIN_INDENT,
    Section, SectionNum, effective_last_section, last_section_number,
};
