//! Filter over the modules a user may select for a bulk action

use crate::course::{CourseId, Item, ItemId};

/// Mutable request handed to selection filter listeners
#[derive(Debug, Clone)]
pub struct SelectionFilter {
    course: CourseId,
    items: Vec<Item>,
}

impl SelectionFilter {
    #[must_use]
    pub const fn new(course: CourseId, items: Vec<Item>) -> Self {
        Self { course, items }
    }

    #[must_use]
    pub const fn course(&self) -> CourseId {
        self.course
    }

    /// Items still selectable, in the order they were given
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn remove_item(&mut self, id: ItemId) {
        self.items.retain(|item| item.id != id);
    }

    pub fn retain(&mut self, keep: impl FnMut(&Item) -> bool) {
        self.items.retain(keep);
    }

    #[must_use]
    pub fn into_ids(self) -> Vec<ItemId> {
        self.items.into_iter().map(|item| item.id).collect()
    }
}
