//! Course-order resolution of a selection
//!
//! Selections arrive unordered. Processing them in the order they appear on
//! the course page (section after section, each section in stored order)
//! means copies appended by duplication end up in the same relative order
//! as their sources.

use std::collections::{HashMap, HashSet};

use super::error::BulkResult;
use crate::course::{CourseId, CourseRepository, ItemId, Section, SectionNum};

/// Where a selected item currently lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub item: ItemId,
    pub section: SectionNum,
}

/// Flatten `sections` and keep the placements of ids in `selected`
#[must_use]
pub fn order_in_sections(sections: &[Section], selected: &HashSet<ItemId>) -> Vec<Placement> {
    sections
        .iter()
        .flat_map(|section| {
            section.items.iter().map(move |&item| Placement {
                item,
                section: section.num,
            })
        })
        .filter(|placement| selected.contains(&placement.item))
        .collect()
}

/// Map every item id of a course structure to its section
#[must_use]
pub fn section_lookup(sections: &[Section]) -> HashMap<ItemId, SectionNum> {
    sections
        .iter()
        .flat_map(|section| section.items.iter().map(move |&item| (item, section.num)))
        .collect()
}

/// Return `ids` in course display order, dropping ids no longer in the course.
///
/// An empty selection returns without reading the course.
///
/// # Errors
/// Returns `BulkError::NotFound` if the course does not exist.
pub fn resolve_order(
    repo: &dyn CourseRepository,
    course: CourseId,
    ids: &[ItemId],
) -> BulkResult<Vec<ItemId>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sections = repo.sections(course)?;
    let selected: HashSet<ItemId> = ids.iter().copied().collect();
    Ok(order_in_sections(&sections, &selected)
        .into_iter()
        .map(|p| p.item)
        .collect())
}

/// Live course structure plus the ordered placements of a selection
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub sections: Vec<Section>,
    pub order: Vec<Placement>,
}

impl Snapshot {
    /// Read the course structure and order the selection against it
    ///
    /// # Errors
    /// Returns `BulkError::NotFound` if the course does not exist.
    pub fn read(repo: &dyn CourseRepository, course: CourseId, ids: &[ItemId]) -> BulkResult<Self> {
        let sections = repo.sections(course)?;
        let selected: HashSet<ItemId> = ids.iter().copied().collect();
        let order = order_in_sections(&sections, &selected);
        Ok(Self { sections, order })
    }

    #[must_use]
    pub fn ordered_ids(&self) -> Vec<ItemId> {
        self.order.iter().map(|p| p.item).collect()
    }

    #[must_use]
    pub fn section_numbers(&self) -> Vec<SectionNum> {
        self.sections.iter().map(|s| s.num).collect()
    }

    #[must_use]
    pub fn section(&self, num: SectionNum) -> Option<&Section> {
        self.sections.iter().find(|s| s.num == num)
    }

    /// First requested id that is not part of the course any more
    #[must_use]
    pub fn first_missing(&self, ids: &[ItemId]) -> Option<ItemId> {
        ids.iter()
            .copied()
            .find(|id| !self.order.iter().any(|p| p.item == *id))
    }
}
