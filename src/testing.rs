//! Testing utilities for massact
//!
//! [`MemoryCourses`] is an in-memory course store implementing every
//! collaborator trait the executor needs, with knobs for injecting read,
//! clone and relocation failures. [`RecordingSink`] keeps emitted events and
//! [`TestDb`] opens a sled database in a temporary directory.
//!
//! Only available when compiled with `cfg(test)`.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};

use tempfile::TempDir;

use crate::course::{
    CacheScope, CloneError, Course, CourseId, CourseRepository, Entity, FormatOptions, Item,
    ItemChanges, ItemCloner, ItemId, ItemRelocator, Section, SectionNum, StoreError, StoreResult,
};
use crate::db::Database;
use crate::events::{BulkEvent, EventSink};
use crate::tasks::{TaskDescriptor, TaskQueue};

#[derive(Default)]
struct State {
    courses: BTreeMap<CourseId, Course>,
    items: BTreeMap<ItemId, Item>,
    next_item: ItemId,
    failing_clones: HashSet<ItemId>,
    failing_relocations: HashSet<ItemId>,
    failing_reads: HashSet<ItemId>,
    unlisted_sections: HashSet<(CourseId, SectionNum)>,
    writes: usize,
    invalidations: Vec<(CourseId, CacheScope)>,
    tasks: Vec<TaskDescriptor>,
}

impl State {
    fn course_mut(&mut self, id: CourseId) -> StoreResult<&mut Course> {
        self.courses
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(Entity::Course, id))
    }

    fn detach(&mut self, item: &Item) {
        if let Some(course) = self.courses.get_mut(&item.course) {
            for section in &mut course.sections {
                section.items.retain(|id| *id != item.id);
            }
        }
    }
}

/// In-memory course store
///
/// # Examples
/// ```ignore
/// let store = MemoryCourses::new();
/// store.add_course(1, 2);
/// let id = store.add_item(1, 0, "forum");
/// assert_eq!(store.order(1), vec![id]);
/// ```
pub struct MemoryCourses {
    state: RefCell<State>,
}

impl Default for MemoryCourses {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCourses {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                next_item: 1,
                ..State::default()
            }),
        }
    }

    /// Add a visible course with sections `0..=last_section`
    pub fn add_course(&self, id: CourseId, last_section: SectionNum) {
        self.state
            .borrow_mut()
            .courses
            .insert(id, Course::new(id, format!("Course {id}"), last_section));
    }

    /// Append an item to a section and return its id
    ///
    /// # Panics
    /// Panics if the course or section does not exist.
    pub fn add_item(&self, course: CourseId, section: SectionNum, kind: &str) -> ItemId {
        let mut state = self.state.borrow_mut();
        let id = state.next_item;
        state.next_item += 1;
        let target = state
            .courses
            .get_mut(&course)
            .and_then(|c| c.sections.iter_mut().find(|s| s.num == section))
            .expect("unknown course or section");
        target.items.push(id);
        let mut item = Item::new(id, course, section, kind);
        item.name = format!("{kind} {id}");
        state.items.insert(id, item);
        id
    }

    /// Remove an item behind the executor's back
    pub fn forget_item(&self, id: ItemId) {
        let mut state = self.state.borrow_mut();
        if let Some(item) = state.items.remove(&id) {
            state.detach(&item);
        }
    }

    /// # Panics
    /// Panics if the course does not exist.
    #[must_use]
    pub fn course_record(&self, id: CourseId) -> Course {
        self.state.borrow().courses[&id].clone()
    }

    /// # Panics
    /// Panics if the item does not exist.
    #[must_use]
    pub fn item_record(&self, id: ItemId) -> Item {
        self.state.borrow().items[&id].clone()
    }

    #[must_use]
    pub fn has_item(&self, id: ItemId) -> bool {
        self.state.borrow().items.contains_key(&id)
    }

    /// All item ids of a course in display order
    #[must_use]
    pub fn order(&self, course: CourseId) -> Vec<ItemId> {
        self.state.borrow().courses[&course]
            .sections
            .iter()
            .flat_map(|s| s.items.iter().copied())
            .collect()
    }

    /// Item ids of one section in stored order
    #[must_use]
    pub fn section_items(&self, course: CourseId, section: SectionNum) -> Vec<ItemId> {
        self.state.borrow().courses[&course]
            .section(section)
            .map(|s| s.items.clone())
            .unwrap_or_default()
    }

    pub fn set_num_sections(&self, course: CourseId, num_sections: Option<SectionNum>) {
        if let Some(c) = self.state.borrow_mut().courses.get_mut(&course) {
            c.format.num_sections = num_sections;
        }
    }

    pub fn set_course_visible(&self, course: CourseId, visible: bool) {
        if let Some(c) = self.state.borrow_mut().courses.get_mut(&course) {
            c.visible = visible;
        }
    }

    pub fn set_section_visible(&self, course: CourseId, section: SectionNum, visible: bool) {
        if let Some(s) = self
            .state
            .borrow_mut()
            .courses
            .get_mut(&course)
            .and_then(|c| c.sections.iter_mut().find(|s| s.num == section))
        {
            s.visible = visible;
        }
    }

    /// Change stored fields without counting a write
    pub fn edit_item(&self, id: ItemId, edit: impl FnOnce(&mut Item)) {
        if let Some(item) = self.state.borrow_mut().items.get_mut(&id) {
            edit(item);
        }
    }

    /// Make cloning of `id` fail
    pub fn fail_clone_of(&self, id: ItemId) {
        self.state.borrow_mut().failing_clones.insert(id);
    }

    /// Make relocating `id` fail
    pub fn fail_relocation_of(&self, id: ItemId) {
        self.state.borrow_mut().failing_relocations.insert(id);
    }

    /// Make reading `id` through the repository fail
    pub fn fail_read_of(&self, id: ItemId) {
        self.state.borrow_mut().failing_reads.insert(id);
    }

    /// Leave `section` out of `sections()`, as if it was removed after the
    /// course record was read
    pub fn unlist_section(&self, course: CourseId, section: SectionNum) {
        self.state.borrow_mut().unlisted_sections.insert((course, section));
    }

    /// Number of `update_item` calls that changed a record
    #[must_use]
    pub fn writes(&self) -> usize {
        self.state.borrow().writes
    }

    #[must_use]
    pub fn invalidations(&self) -> Vec<(CourseId, CacheScope)> {
        self.state.borrow().invalidations.clone()
    }

    #[must_use]
    pub fn queued_tasks(&self) -> Vec<TaskDescriptor> {
        self.state.borrow().tasks.clone()
    }
}

impl CourseRepository for MemoryCourses {
    fn course(&self, id: CourseId) -> StoreResult<Course> {
        self.state
            .borrow()
            .courses
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::Course, id))
    }

    fn sections(&self, course: CourseId) -> StoreResult<Vec<Section>> {
        let mut sections = self.course(course)?.sections;
        let state = self.state.borrow();
        sections.retain(|s| !state.unlisted_sections.contains(&(course, s.num)));
        Ok(sections)
    }

    fn create_section(&self, course: CourseId) -> StoreResult<SectionNum> {
        let mut state = self.state.borrow_mut();
        let record = state.course_mut(course)?;
        let num = record.physical_last_section() + 1;
        record.sections.push(Section::new(num));
        Ok(num)
    }

    fn update_format_options(&self, course: CourseId, options: &FormatOptions) -> StoreResult<()> {
        self.state.borrow_mut().course_mut(course)?.format = options.clone();
        Ok(())
    }

    fn item(&self, id: ItemId) -> StoreResult<Item> {
        let state = self.state.borrow();
        if state.failing_reads.contains(&id) {
            return Err(StoreError::Backend(format!("read of {id} refused")));
        }
        state
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::Item, id))
    }

    fn update_item(&self, id: ItemId, changes: &ItemChanges) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(Entity::Item, id))?;
        changes.apply(item);
        state.writes += 1;
        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        let item = state
            .items
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(Entity::Item, id))?;
        state.detach(&item);
        Ok(())
    }

    fn invalidate_cache(&self, course: CourseId, scope: CacheScope) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        state.course_mut(course)?.cache_rev += 1;
        state.invalidations.push((course, scope));
        Ok(())
    }
}

impl ItemCloner for MemoryCourses {
    fn clone_item(&self, source: &Item, target: CourseId) -> Result<ItemId, CloneError> {
        let mut state = self.state.borrow_mut();
        if state.failing_clones.contains(&source.id) {
            return Err(CloneError(format!("cannot duplicate {}", source.name)));
        }
        let id = state.next_item;
        let record = state.course_mut(target)?;

        let section = if target == source.course {
            let section = record
                .sections
                .iter_mut()
                .find(|s| s.items.contains(&source.id))
                .ok_or_else(|| StoreError::not_found(Entity::Item, source.id))?;
            let at = section.items.iter().position(|i| *i == source.id).map_or(0, |p| p + 1);
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
                .ok_or_else(|| StoreError::not_found(Entity::Section, u64::from(num)))?;
            section.items.push(id);
            num
        };

        let mut copy = source.clone();
        copy.id = id;
        copy.course = target;
        copy.section = section;
        copy.name = format!("{} (copy)", source.name);
        state.items.insert(id, copy);
        state.next_item += 1;
        Ok(id)
    }
}

impl ItemRelocator for MemoryCourses {
    fn relocate(&self, id: ItemId, section: SectionNum) -> StoreResult<()> {
        let mut state = self.state.borrow_mut();
        if state.failing_relocations.contains(&id) {
            return Err(StoreError::Backend(format!("relocation of {id} refused")));
        }
        let item = state
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::Item, id))?;
        if state.course_mut(item.course)?.section(section).is_none() {
            return Err(StoreError::not_found(Entity::Section, u64::from(section)));
        }
        state.detach(&item);
        let record = state.course_mut(item.course)?;
        if let Some(target) = record.sections.iter_mut().find(|s| s.num == section) {
            target.items.push(id);
        }
        if let Some(stored) = state.items.get_mut(&id) {
            stored.section = section;
        }
        Ok(())
    }
}

impl TaskQueue for MemoryCourses {
    fn enqueue(&self, task: TaskDescriptor, allow_duplicates: bool) -> StoreResult<bool> {
        let mut state = self.state.borrow_mut();
        if !allow_duplicates && state.tasks.contains(&task) {
            return Ok(false);
        }
        state.tasks.push(task);
        Ok(true)
    }
}

/// Event sink that keeps everything it receives
#[derive(Default)]
pub struct RecordingSink {
    events: RefCell<Vec<BulkEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<BulkEvent> {
        self.events.borrow().clone()
    }

    /// Event names in emission order
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(BulkEvent::name).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &BulkEvent) {
        self.events.borrow_mut().push(event.clone());
    }
}

/// Temporary sled database, removed together with its directory on drop
pub struct TestDb {
    db: Database,
    _dir: TempDir,
}

impl TestDb {
    /// # Panics
    /// Panics if the temporary directory or the database cannot be created.
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let db = Database::open(dir.path()).expect("Failed to open test database");
        Self { db, _dir: dir }
    }

    #[must_use]
    pub const fn db(&self) -> &Database {
        &self.db
    }
}

impl Default for TestDb {
    fn default() -> Self {
        Self::new()
    }
}
