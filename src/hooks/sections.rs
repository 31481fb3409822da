//! Section filter request and the policy decision derived from it

use std::collections::BTreeSet;

use crate::course::{CourseId, SectionNum};

/// Which side of an operation the sections are filtered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Source sections, or destinations inside the same course
    SameCourse,
    /// Destination sections of a course receiving modules from elsewhere
    DifferentCourse,
}

/// Mutable request handed to section filter listeners.
///
/// Listeners can only narrow it: sections can be removed and permissions
/// can be withdrawn, but nothing outside the original candidate set can be
/// added back.
#[derive(Debug, Clone)]
pub struct SectionFilter {
    course: CourseId,
    mode: FilterMode,
    candidates: BTreeSet<SectionNum>,
    sections: BTreeSet<SectionNum>,
    keep_origin_section: bool,
    make_section_allowed: bool,
}

impl SectionFilter {
    #[must_use]
    pub fn new(
        course: CourseId,
        candidates: impl IntoIterator<Item = SectionNum>,
        mode: FilterMode,
    ) -> Self {
        let candidates: BTreeSet<SectionNum> = candidates.into_iter().collect();
        Self {
            course,
            mode,
            sections: candidates.clone(),
            candidates,
            keep_origin_section: true,
            make_section_allowed: true,
        }
    }

    #[must_use]
    pub const fn course(&self) -> CourseId {
        self.course
    }

    #[must_use]
    pub const fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Sections the request started with
    #[must_use]
    pub const fn candidates(&self) -> &BTreeSet<SectionNum> {
        &self.candidates
    }

    /// Sections still allowed
    #[must_use]
    pub const fn sections(&self) -> &BTreeSet<SectionNum> {
        &self.sections
    }

    pub fn remove_section(&mut self, num: SectionNum) {
        self.sections.remove(&num);
    }

    pub fn retain_sections(&mut self, mut keep: impl FnMut(SectionNum) -> bool) {
        self.sections.retain(|num| keep(*num));
    }

    /// Whether modules may keep their original section number
    #[must_use]
    pub const fn is_origin_section_kept(&self) -> bool {
        self.keep_origin_section
    }

    pub const fn disable_origin_section(&mut self) {
        self.keep_origin_section = false;
    }

    /// Whether new sections may be created for the operation
    #[must_use]
    pub const fn is_make_section_allowed(&self) -> bool {
        self.make_section_allowed
    }

    pub const fn disable_make_section(&mut self) {
        self.make_section_allowed = false;
    }

    /// Freeze the request into a decision
    #[must_use]
    pub fn into_decision(self) -> PolicyDecision {
        PolicyDecision {
            allowed: self.sections,
            allow_origin_section: self.keep_origin_section,
            allow_section_creation: self.make_section_allowed,
        }
    }
}

/// Outcome of consulting section filter listeners for one batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: BTreeSet<SectionNum>,
    pub allow_origin_section: bool,
    pub allow_section_creation: bool,
}

impl PolicyDecision {
    #[must_use]
    pub fn allows(&self, num: SectionNum) -> bool {
        self.allowed.contains(&num)
    }
}
