//! Database wrapper module for massact
//!
//! Stores courses, modules, deferred tasks and the event log in sled and
//! implements every collaborator the bulk executor works through.
//!
//! Uses multiple sled trees:
//! - `courses`: course id -> course record (sections with their module ids)
//! - `items`: module id -> module record
//! - `tasks`: sequence -> pending task
//! - `events`: sequence -> JSON event envelope

use std::path::Path;

use sled::{Db, Tree};
use tracing::{debug, warn};

use crate::course::{
    CacheScope, CloneError, Course, CourseId, CourseRepository, Entity, FormatOptions, Item,
    ItemChanges, ItemCloner, ItemId, ItemRelocator, Section, SectionNum, StoreResult,
};
use crate::events::{BulkEvent, EventEnvelope, EventSink};
use crate::tasks::{TaskDescriptor, TaskQueue};

pub mod error;
pub mod types;

pub use error::DbError;
pub use types::IdKey;

use types::{decode, encode};

/// Database wrapper that encapsulates all database operations
pub struct Database {
    db: Db,
    courses: Tree,
    items: Tree,
    tasks: Tree,
    events: Tree,
}

impl Database {
    /// Opens or creates a database at the specified path
    ///
    /// # Examples
    /// ```no_run
    /// use massact::db::Database;
    /// let db = Database::open("my_db").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the database or one of its trees cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DbError> {
        let db = sled::open(path)?;
        let courses = db.open_tree("courses")?;
        let items = db.open_tree("items")?;
        let tasks = db.open_tree("tasks")?;
        let events = db.open_tree("events")?;
        Ok(Self {
            db,
            courses,
            items,
            tasks,
            events,
        })
    }

    /// Fresh id, never 0
    fn next_id(&self) -> Result<u64, DbError> {
        Ok(self.db.generate_id()? + 1)
    }

    /// Create a visible course with sections `0..=last_section`
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the course cannot be written.
    pub fn create_course(&self, name: &str, last_section: SectionNum) -> Result<Course, DbError> {
        let course = Course::new(self.next_id()?, name, last_section);
        self.put_course(&course)?;
        debug!(course = course.id, name, last_section, "course created");
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `DbError` if the record cannot be read or decoded.
    pub fn get_course(&self, id: CourseId) -> Result<Option<Course>, DbError> {
        self.courses
            .get(IdKey::new(id).to_bytes())?
            .map(|value| decode(&value))
            .transpose()
    }

    fn load_course(&self, id: CourseId) -> Result<Course, DbError> {
        self.get_course(id)?.ok_or(DbError::NotFound {
            entity: Entity::Course,
            id,
        })
    }

    fn put_course(&self, course: &Course) -> Result<(), DbError> {
        self.courses
            .insert(IdKey::new(course.id).to_bytes(), encode(course)?)?;
        Ok(())
    }

    /// All courses ordered by id
    ///
    /// # Errors
    ///
    /// Returns `DbError` if iteration or decoding fails.
    pub fn list_courses(&self) -> Result<Vec<Course>, DbError> {
        self.courses
            .iter()
            .map(|entry| -> Result<Course, DbError> {
                let (_, value) = entry?;
                decode(&value)
            })
            .collect()
    }

    /// Append a new module to the end of a section
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` for a missing course and
    /// `DbError::InvalidInput` for a missing section.
    pub fn add_item(
        &self,
        course: CourseId,
        section: SectionNum,
        kind: &str,
        name: &str,
    ) -> Result<Item, DbError> {
        let mut record = self.load_course(course)?;
        let id = self.next_id()?;
        let target = record
            .sections
            .iter_mut()
            .find(|s| s.num == section)
            .ok_or_else(|| {
                DbError::InvalidInput(format!("course {course} has no section {section}"))
            })?;
        target.items.push(id);

        let mut item = Item::new(id, course, section, kind);
        item.name = name.to_string();
        self.put_item(&item)?;
        self.put_course(&record)?;
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns `DbError` if the record cannot be read or decoded.
    pub fn get_item(&self, id: ItemId) -> Result<Option<Item>, DbError> {
        self.items
            .get(IdKey::new(id).to_bytes())?
            .map(|value| decode(&value))
            .transpose()
    }

    fn load_item(&self, id: ItemId) -> Result<Item, DbError> {
        self.get_item(id)?.ok_or(DbError::NotFound {
            entity: Entity::Item,
            id,
        })
    }

    fn put_item(&self, item: &Item) -> Result<(), DbError> {
        self.items.insert(IdKey::new(item.id).to_bytes(), encode(item)?)?;
        Ok(())
    }

    /// Modules of a course in display order
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if the course or one of its modules is missing.
    pub fn course_items(&self, course: CourseId) -> Result<Vec<Item>, DbError> {
        self.load_course(course)?
            .sections
            .iter()
            .flat_map(|s| s.items.iter().copied())
            .map(|id| self.load_item(id))
            .collect()
    }

    /// Load modules by id, failing on the first unknown one
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` for an unknown id.
    pub fn items_by_id(&self, ids: &[ItemId]) -> Result<Vec<Item>, DbError> {
        ids.iter().map(|id| self.load_item(*id)).collect()
    }

    /// Pending tasks in the order they were queued
    ///
    /// # Errors
    ///
    /// Returns `DbError` if iteration or decoding fails.
    pub fn pending_tasks(&self) -> Result<Vec<(u64, TaskDescriptor)>, DbError> {
        self.tasks
            .iter()
            .map(|entry| -> Result<(u64, TaskDescriptor), DbError> {
                let (key, value) = entry?;
                Ok((IdKey::from_bytes(&key)?.get(), decode(&value)?))
            })
            .collect()
    }

    /// Drop a task from the queue; `false` if it was not pending
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the removal fails.
    pub fn complete_task(&self, id: u64) -> Result<bool, DbError> {
        Ok(self.tasks.remove(IdKey::new(id).to_bytes())?.is_some())
    }

    fn push_task(&self, task: TaskDescriptor, allow_duplicates: bool) -> Result<bool, DbError> {
        if !allow_duplicates && self.pending_tasks()?.iter().any(|(_, t)| *t == task) {
            debug!(kind = task.kind(), "identical task already pending");
            return Ok(false);
        }
        self.tasks.insert(IdKey::new(self.next_id()?).to_bytes(), encode(&task)?)?;
        Ok(true)
    }

    fn record_event(&self, event: &BulkEvent) -> Result<(), DbError> {
        let envelope = EventEnvelope::now(event.clone());
        let payload = serde_json::to_vec(&envelope)?;
        self.events.insert(IdKey::new(self.next_id()?).to_bytes(), payload)?;
        Ok(())
    }

    /// Logged events, oldest first, optionally limited to one course
    ///
    /// # Errors
    ///
    /// Returns `DbError` if iteration or decoding fails.
    pub fn events(&self, course: Option<CourseId>) -> Result<Vec<EventEnvelope>, DbError> {
        let mut envelopes = Vec::new();
        for entry in &self.events {
            let (_, value) = entry?;
            let envelope: EventEnvelope = serde_json::from_slice(&value)?;
            if course.is_none_or(|c| envelope.event.course() == c) {
                envelopes.push(envelope);
            }
        }
        Ok(envelopes)
    }

    /// Flush all pending writes to disk
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the flush operation fails.
    pub fn flush(&self) -> Result<(), DbError> {
        self.db.flush()?;
        Ok(())
    }

    /// Clear every tree
    ///
    /// # Warning
    /// This operation is irreversible!
    ///
    /// # Errors
    ///
    /// Returns `DbError` if clearing one of the trees fails.
    pub fn clear(&self) -> Result<(), DbError> {
        self.courses.clear()?;
        self.items.clear()?;
        self.tasks.clear()?;
        self.events.clear()?;
        Ok(())
    }

    fn detach(&self, item: &Item) -> Result<(), DbError> {
        let mut record = self.load_course(item.course)?;
        for section in &mut record.sections {
            section.items.retain(|id| *id != item.id);
        }
        self.put_course(&record)
    }

    fn clone_into(&self, source: &Item, target: CourseId) -> Result<ItemId, DbError> {
        let mut record = self.load_course(target)?;
        let id = self.next_id()?;

        let section = if target == source.course {
            let section = record
                .sections
                .iter_mut()
                .find(|s| s.items.contains(&source.id))
                .ok_or(DbError::NotFound {
                    entity: Entity::Item,
                    id: source.id,
                })?;
            let at = section
                .items
                .iter()
                .position(|i| *i == source.id)
                .map_or(section.items.len(), |p| p + 1);
            section.items.insert(at, id);
            section.num
        } else {
            let num = if record.section(source.section).is_some() {
                source.section
            } else {
                record.physical_last_section()
            };
            let section = record
                .sections
                .iter_mut()
                .find(|s| s.num == num)
                .ok_or(DbError::NotFound {
                    entity: Entity::Section,
                    id: u64::from(num),
                })?;
            section.items.push(id);
            num
        };

        let mut copy = source.clone();
        copy.id = id;
        copy.course = target;
        copy.section = section;
        copy.name = format!("{} (copy)", source.name);
        self.put_item(&copy)?;
        self.put_course(&record)?;
        Ok(id)
    }

    fn move_item(&self, id: ItemId, section: SectionNum) -> Result<(), DbError> {
        let mut item = self.load_item(id)?;
        let mut record = self.load_course(item.course)?;
        if record.section(section).is_none() {
            return Err(DbError::NotFound {
                entity: Entity::Section,
                id: u64::from(section),
            });
        }
        for s in &mut record.sections {
            s.items.retain(|i| *i != id);
            if s.num == section {
                s.items.push(id);
            }
        }
        item.section = section;
        self.put_course(&record)?;
        self.put_item(&item)
    }
}

impl CourseRepository for Database {
    fn course(&self, id: CourseId) -> StoreResult<Course> {
        Ok(self.load_course(id)?)
    }

    fn sections(&self, course: CourseId) -> StoreResult<Vec<Section>> {
        Ok(self.load_course(course)?.sections)
    }

    fn create_section(&self, course: CourseId) -> StoreResult<SectionNum> {
        let mut record = self.load_course(course)?;
        let num = record.physical_last_section() + 1;
        record.sections.push(Section::new(num));
        self.put_course(&record)?;
        debug!(course, section = num, "section created");
        Ok(num)
    }

    fn update_format_options(&self, course: CourseId, options: &FormatOptions) -> StoreResult<()> {
        let mut record = self.load_course(course)?;
        record.format = options.clone();
        Ok(self.put_course(&record)?)
    }

    fn item(&self, id: ItemId) -> StoreResult<Item> {
        Ok(self.load_item(id)?)
    }

    fn update_item(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<()> {
        let mut item = self.load_item(id)?;
        changes.apply(&mut item);
        Ok(self.put_item(&item)?)
    }

    fn delete_item(&self, id: ItemId) -> StoreResult<()> {
        let item = self.load_item(id)?;
        self.detach(&item)?;
        self.items.remove(IdKey::new(id).to_bytes()).map_err(DbError::from)?;
        Ok(())
    }

    fn invalidate_cache(&self, course: CourseId, scope: CacheScope) -> StoreResult<()> {
        let mut record = self.load_course(course)?;
        record.cache_rev += 1;
        self.put_course(&record)?;
        debug!(course, ?scope, rev = record.cache_rev, "course cache invalidated");
        Ok(())
    }
}

impl ItemCloner for Database {
    fn clone_item(&self, source: &Item, target: CourseId) -> Result<ItemId, CloneError> {
        self.clone_into(source, target)
            .map_err(|e| CloneError(e.to_string()))
    }
}

impl ItemRelocator for Database {
    fn relocate(&self, item: ItemId, section: SectionNum) -> StoreResult<()> {
        Ok(self.move_item(item, section)?)
    }
}

impl TaskQueue for Database {
    fn enqueue(&self, task: TaskDescriptor, allow_duplicates: bool) -> StoreResult<bool> {
        Ok(self.push_task(task, allow_duplicates)?)
    }
}

impl EventSink for Database {
    fn emit(&self, event: &BulkEvent) {
        if let Err(e) = self.record_event(event) {
            warn!(name = event.name(), error = %e, "could not log event");
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        // Best-effort flush; callers needing durability call flush()
        let _ = self.db.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestDb;

    #[test]
    fn test_create_course_and_items() {
        let test_db = TestDb::new();
        let db = test_db.db();

        let course = db.create_course("Biology", 2).unwrap();
        let a = db.add_item(course.id, 1, "page", "Intro").unwrap();
        let b = db.add_item(course.id, 0, "forum", "News").unwrap();

        let items: Vec<ItemId> = db.course_items(course.id).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(items, vec![b.id, a.id]);
        assert_eq!(db.list_courses().unwrap().len(), 1);
        assert_eq!(db.get_item(a.id).unwrap().unwrap().name, "Intro");
    }

    #[test]
    fn test_add_item_to_missing_section() {
        let test_db = TestDb::new();
        let db = test_db.db();
        let course = db.create_course("Art", 0).unwrap();

        let result = db.add_item(course.id, 3, "page", "Lost");
        assert!(matches!(result, Err(DbError::InvalidInput(_))));
        assert!(db.course_items(course.id).unwrap().is_empty());
    }

    #[test]
    fn test_missing_records_are_not_found() {
        let test_db = TestDb::new();
        let db = test_db.db();

        assert!(db.get_course(42).unwrap().is_none());
        assert!(!db.course_exists(42).unwrap());
        assert!(matches!(
            db.item(42),
            Err(crate::course::StoreError::NotFound { id: 42, .. })
        ));
    }

    #[test]
    fn test_clone_same_course_lands_after_source() {
        let test_db = TestDb::new();
        let db = test_db.db();
        let course = db.create_course("Math", 1).unwrap();
        let a = db.add_item(course.id, 1, "page", "A").unwrap();
        let b = db.add_item(course.id, 1, "quiz", "B").unwrap();

        let copy = db.clone_item(&a, course.id).unwrap();
        assert_eq!(db.sections(course.id).unwrap()[1].items, vec![a.id, copy, b.id]);
        assert_eq!(db.item(copy).unwrap().name, "A (copy)");
    }

    #[test]
    fn test_clone_other_course_falls_back_to_last_section() {
        let test_db = TestDb::new();
        let db = test_db.db();
        let source = db.create_course("Source", 3).unwrap();
        let target = db.create_course("Target", 1).unwrap();
        let a = db.add_item(source.id, 3, "page", "A").unwrap();

        let copy = db.clone_item(&a, target.id).unwrap();
        let stored = db.item(copy).unwrap();
        assert_eq!((stored.course, stored.section), (target.id, 1));
    }

    #[test]
    fn test_relocate_and_delete() {
        let test_db = TestDb::new();
        let db = test_db.db();
        let course = db.create_course("Chem", 1).unwrap();
        let a = db.add_item(course.id, 0, "page", "A").unwrap();

        db.relocate(a.id, 1).unwrap();
        assert_eq!(db.item(a.id).unwrap().section, 1);
        assert_eq!(db.sections(course.id).unwrap()[1].items, vec![a.id]);
        assert!(db.relocate(a.id, 9).is_err());

        db.delete_item(a.id).unwrap();
        assert!(db.get_item(a.id).unwrap().is_none());
        assert!(db.course_items(course.id).unwrap().is_empty());
    }

    #[test]
    fn test_task_queue_suppresses_duplicates() {
        let test_db = TestDb::new();
        let db = test_db.db();
        let task = TaskDescriptor::ContentNotification {
            update: true,
            item: 1,
            course: 2,
            user_from: 3,
        };

        assert!(db.enqueue(task.clone(), false).unwrap());
        assert!(!db.enqueue(task.clone(), false).unwrap());
        assert!(db.enqueue(task, true).unwrap());

        let pending = db.pending_tasks().unwrap();
        assert_eq!(pending.len(), 2);
        assert!(db.complete_task(pending[0].0).unwrap());
        assert!(!db.complete_task(pending[0].0).unwrap());
        assert_eq!(db.pending_tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_event_log_filters_by_course() {
        let test_db = TestDb::new();
        let db = test_db.db();

        db.emit(&BulkEvent::ModuleUpdated { course: 1, item: 5 });
        db.emit(&BulkEvent::ModuleUpdated { course: 2, item: 6 });

        assert_eq!(db.events(None).unwrap().len(), 2);
        let only = db.events(Some(2)).unwrap();
        assert_eq!(only.len(), 1);
        assert_eq!(only[0].event, BulkEvent::ModuleUpdated { course: 2, item: 6 });
    }

    #[test]
    fn test_cache_invalidation_bumps_revision() {
        let test_db = TestDb::new();
        let db = test_db.db();
        let course = db.create_course("Geo", 0).unwrap();

        db.invalidate_cache(course.id, CacheScope::Course).unwrap();
        db.invalidate_cache(course.id, CacheScope::Item(1)).unwrap();
        assert_eq!(db.course(course.id).unwrap().cache_rev, 2);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let db = Database::open(dir.path()).unwrap();
            let course = db.create_course("Persisted", 1).unwrap();
            db.flush().unwrap();
            course.id
        };
        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.course(id).unwrap().name, "Persisted");
    }
}
