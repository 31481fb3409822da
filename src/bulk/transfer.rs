//! Duplication into another course

use std::fmt;

use tracing::info;

use super::core::BatchOutcome;
use super::error::{BulkError, BulkResult};
use super::executor::{BulkExecutor, batch_scope};
use crate::auth::Capability;
use crate::course::{CloneError, CourseId, Entity, Item, ItemId, SectionNum};
use crate::events::BulkEvent;
use crate::hooks::FilterMode;

/// Where copies land in the target course
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TargetSection {
    /// Same section number as in the source course
    #[default]
    PreserveSource,
    /// A fixed section; numbers past the end request a new section
    Section(SectionNum),
}

impl From<Option<SectionNum>> for TargetSection {
    fn from(section: Option<SectionNum>) -> Self {
        section.map_or(Self::PreserveSource, Self::Section)
    }
}

impl fmt::Display for TargetSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreserveSource => f.write_str("original section"),
            Self::Section(num) => write!(f, "section {num}"),
        }
    }
}

impl BulkExecutor<'_> {
    /// Duplicate modules into `target_course`.
    ///
    /// Requires export capability on the source and import capability on
    /// the target. Missing sections are created when the user may update
    /// the target course and policies allow it.
    ///
    /// # Errors
    /// Rejects the batch before any copy is made on missing capabilities,
    /// missing courses, restricted sections or insufficient capacity.
    /// Failures of single copies are recorded in the outcome.
    pub fn duplicate_to_course(
        &self,
        items: &[Item],
        target_course: CourseId,
        target: TargetSection,
    ) -> BulkResult<BatchOutcome> {
        let Some((source_course, ids)) = batch_scope(items)? else {
            return Ok(BatchOutcome::new());
        };

        self.require(Capability::BackupTargetImport, source_course)?;
        self.require(Capability::RestoreTargetImport, target_course)?;
        self.require_course(source_course)?;
        self.require_course(target_course)?;

        let repo = self.services.repository;
        let target_record = repo.course(target_course)?;
        let last_section = target_record.last_section();
        let target_decision = self.decision(
            target_course,
            target_record.section_numbers(),
            FilterMode::DifferentCourse,
        );
        let can_add_section = self
            .services
            .authorization
            .has_capability(Capability::CourseUpdate, target_course)
            && target_decision.allow_section_creation;

        let snapshot = self.snapshot(source_course, &ids)?;
        let source_decision = self.decision(
            source_course,
            snapshot.section_numbers(),
            FilterMode::SameCourse,
        );
        if let Some(p) = snapshot.order.iter().find(|p| !source_decision.allows(p.section)) {
            return Err(BulkError::RestrictedSection {
                course: source_course,
                section: p.section,
            });
        }

        let destination = match target {
            TargetSection::PreserveSource => {
                if !target_decision.allow_origin_section {
                    return Err(BulkError::OriginSectionRestricted {
                        course: target_course,
                    });
                }
                if let Some(max) = snapshot.order.iter().map(|p| p.section).max() {
                    self.capacity()
                        .ensure_capacity_up_to(target_course, max, can_add_section)?;
                }
                None
            }
            TargetSection::Section(num) if num > last_section => Some(
                self.capacity()
                    .ensure_section(target_course, num, can_add_section)?,
            ),
            TargetSection::Section(num) => {
                if !target_decision.allows(num) {
                    return Err(BulkError::RestrictedSection {
                        course: target_course,
                        section: num,
                    });
                }
                Some(num)
            }
        };

        let mut outcome = BatchOutcome::new();
        self.record_missing(source_course, &ids, &snapshot.ordered_ids(), &mut outcome);

        for p in &snapshot.order {
            let source = match repo.item(p.item) {
                Ok(source) => source,
                Err(e) => {
                    self.record_clone_failure(source_course, p.item, &CloneError::from(e), &mut outcome);
                    continue;
                }
            };
            // The module may have moved since the structure was read.
            if source.course != source_course {
                let err = CloneError(format!("moved to course {}", source.course));
                self.record_clone_failure(source_course, p.item, &err, &mut outcome);
                continue;
            }
            if !source_decision.allows(source.section) {
                return Err(BulkError::RestrictedSection {
                    course: source_course,
                    section: source.section,
                });
            }

            match self.services.cloner.clone_item(&source, target_course) {
                Ok(copy) => outcome.add_success(p.item, copy),
                Err(e) => self.record_clone_failure(source_course, p.item, &e, &mut outcome),
            }
        }

        if let Some(section) = destination {
            self.place_copies(source_course, target_course, section, &mut outcome)?;
        }

        info!(
            source_course,
            target_course,
            %target,
            duplicated = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "modules duplicated to course"
        );
        self.emit(&BulkEvent::ModulesDuplicated {
            course: source_course,
            target_course,
            duplicated: outcome.duplicated(),
            failed: outcome.failed_ids(),
        });
        Ok(outcome)
    }

    /// Move every produced copy to the end of `section` in `course`.
    /// Copies that cannot be placed are reported against `source_course`.
    fn place_copies(
        &self,
        source_course: CourseId,
        course: CourseId,
        section: SectionNum,
        outcome: &mut BatchOutcome,
    ) -> BulkResult<()> {
        let sections = self.services.repository.sections(course)?;
        let copies: Vec<(ItemId, ItemId)> = outcome.succeeded.clone();
        if !sections.iter().any(|s| s.num == section) {
            let missing = BulkError::not_found(Entity::Section, u64::from(section));
            for (source, _) in copies {
                let error = format!("cmid:{source}({missing})");
                self.record_duplicate_failure(source_course, source, error, outcome);
            }
            return Ok(());
        }
        for (source, copy) in copies {
            if let Err(e) = self.services.relocator.relocate(copy, section) {
                let error = format!("cmid:{source}({e})");
                self.record_duplicate_failure(source_course, source, error, outcome);
            }
        }
        Ok(())
    }
}
