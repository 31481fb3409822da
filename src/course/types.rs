//! Course structure records
//!
//! A course is an ordered list of numbered sections, each holding an ordered
//! list of item ids. Section `0` is the general section and always exists.
//! Item records carry their own course and section number so that a single
//! lookup answers "where does this item live right now".

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Identifier of a course
pub type CourseId = u64;

/// Identifier of a course module (item)
pub type ItemId = u64;

/// Section number within a course (`0` is the general section)
pub type SectionNum = u32;

/// Smallest indentation an item can have on the course page
pub const MIN_INDENT: u8 = 0;

/// Largest indentation an item can have on the course page
pub const MAX_INDENT: u8 = 16;

/// A course module
#[derive(Encode, Decode, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Item {
    pub id: ItemId,
    pub course: CourseId,
    pub section: SectionNum,
    /// Module type, e.g. `assign`, `page`, `label`
    pub kind: String,
    pub name: String,
    pub visible: bool,
    pub visible_on_page: bool,
    pub indent: u8,
    pub show_description: bool,
    /// Whether the module has its own view page; labels do not
    pub has_view: bool,
}

impl Item {
    /// Create a visible, unindented item of the given kind
    #[must_use]
    pub fn new(id: ItemId, course: CourseId, section: SectionNum, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            id,
            course,
            section,
            has_view: kind != "label",
            name: format!("{kind} {id}"),
            kind,
            visible: true,
            visible_on_page: true,
            indent: MIN_INDENT,
            show_description: false,
        }
    }
}

/// A numbered section holding item ids in display order
#[derive(Encode, Decode, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Section {
    pub num: SectionNum,
    pub visible: bool,
    pub items: Vec<ItemId>,
}

impl Section {
    #[must_use]
    pub const fn new(num: SectionNum) -> Self {
        Self {
            num,
            visible: true,
            items: Vec::new(),
        }
    }
}

/// Course format options that influence section bookkeeping
#[derive(Encode, Decode, Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Number of sections the format declares (`numsections`).
    ///
    /// Formats without the option show every physical section. When the
    /// declared count is lower than the physical last section number, the
    /// extra sections are orphaned.
    pub num_sections: Option<SectionNum>,
}

/// A course
#[derive(Encode, Decode, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub visible: bool,
    pub sections: Vec<Section>,
    pub format: FormatOptions,
    /// Bumped every time the course cache is rebuilt
    pub cache_rev: u64,
}

impl Course {
    /// Create a visible course with sections `0..=last_section`
    #[must_use]
    pub fn new(id: CourseId, name: impl Into<String>, last_section: SectionNum) -> Self {
        Self {
            id,
            name: name.into(),
            visible: true,
            sections: (0..=last_section).map(Section::new).collect(),
            format: FormatOptions::default(),
            cache_rev: 0,
        }
    }

    /// Number of the physically last section
    #[must_use]
    pub fn physical_last_section(&self) -> SectionNum {
        last_section_number(&self.sections)
    }

    /// Last section number as exposed by the course format
    #[must_use]
    pub fn last_section(&self) -> SectionNum {
        effective_last_section(&self.sections, &self.format)
    }

    /// All section numbers in order
    #[must_use]
    pub fn section_numbers(&self) -> Vec<SectionNum> {
        self.sections.iter().map(|s| s.num).collect()
    }

    #[must_use]
    pub fn section(&self, num: SectionNum) -> Option<&Section> {
        self.sections.iter().find(|s| s.num == num)
    }
}

/// Number of the last section in a section list (`0` when empty)
#[must_use]
pub fn last_section_number(sections: &[Section]) -> SectionNum {
    sections.iter().map(|s| s.num).max().unwrap_or(0)
}

/// Last section number visible through the format's declared section count
#[must_use]
pub fn effective_last_section(sections: &[Section], format: &FormatOptions) -> SectionNum {
    let physical = last_section_number(sections);
    format
        .num_sections
        .map_or(physical, |declared| declared.min(physical))
}

/// Field updates applied to an item record; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub visible: Option<bool>,
    pub visible_on_page: Option<bool>,
    pub indent: Option<u8>,
    pub show_description: Option<bool>,
}

impl ItemChanges {
    /// Apply the changes to an item record
    pub fn apply(&self, item: &mut Item) {
        if let Some(visible) = self.visible {
            item.visible = visible;
        }
        if let Some(visible_on_page) = self.visible_on_page {
            item.visible_on_page = visible_on_page;
        }
        if let Some(indent) = self.indent {
            item.indent = indent;
        }
        if let Some(show) = self.show_description {
            item.show_description = show;
        }
    }
}

/// What part of the cached course structure must be rebuilt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheScope {
    Course,
    Item(ItemId),
}
