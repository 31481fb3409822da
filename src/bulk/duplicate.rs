//! Duplication inside the source course

use tracing::{info, warn};

use super::core::BatchOutcome;
use super::error::{BulkError, BulkResult};
use super::executor::{BulkExecutor, batch_scope};
use super::order::section_lookup;
use crate::course::{CloneError, CourseId, Entity, Item, ItemId, SectionNum};
use crate::events::BulkEvent;
use crate::hooks::FilterMode;

impl BulkExecutor<'_> {
    /// Duplicate modules within their course.
    ///
    /// Copies are created in course order, so after the move phase the
    /// copies appear after all originals in the same relative order. With
    /// `section == None` each copy goes to the end of its own section,
    /// otherwise every copy goes to the end of `section`.
    ///
    /// # Errors
    /// Rejects the batch before any copy is made when the course or the
    /// destination section is missing, or a source section is restricted.
    /// Failures of single copies are recorded in the outcome.
    pub fn duplicate(&self, items: &[Item], section: Option<SectionNum>) -> BulkResult<BatchOutcome> {
        match batch_scope(items)? {
            Some((course, ids)) => self.duplicate_in_course(course, &ids, section),
            None => Ok(BatchOutcome::new()),
        }
    }

    /// [`duplicate`](Self::duplicate) for a course and module ids
    ///
    /// # Errors
    /// See [`duplicate`](Self::duplicate).
    pub fn duplicate_in_course(
        &self,
        course: CourseId,
        ids: &[ItemId],
        section: Option<SectionNum>,
    ) -> BulkResult<BatchOutcome> {
        if ids.is_empty() {
            return Ok(BatchOutcome::new());
        }
        self.require_course(course)?;

        let snapshot = self.snapshot(course, ids)?;
        let decision = self.decision(course, snapshot.section_numbers(), FilterMode::SameCourse);
        if let Some(p) = snapshot.order.iter().find(|p| !decision.allows(p.section)) {
            return Err(BulkError::RestrictedSection {
                course,
                section: p.section,
            });
        }
        if let Some(target) = section
            && snapshot.section(target).is_none()
        {
            return Err(BulkError::not_found(Entity::Section, u64::from(target)));
        }

        let repo = self.services.repository;
        let mut outcome = BatchOutcome::new();
        self.record_missing(course, ids, &snapshot.ordered_ids(), &mut outcome);

        for p in &snapshot.order {
            let copy = repo
                .item(p.item)
                .map_err(CloneError::from)
                .and_then(|source| self.services.cloner.clone_item(&source, course));
            match copy {
                Ok(copy) => outcome.add_success(p.item, copy),
                Err(e) => self.record_clone_failure(course, p.item, &e, &mut outcome),
            }
        }

        // Copies were inserted next to their sources; read the structure again
        // to learn where they ended up before moving them.
        let placed = section_lookup(&repo.sections(course)?);
        for (source, copy) in outcome.succeeded.clone() {
            let destination = match section.or_else(|| placed.get(&copy).copied()) {
                Some(num) => num,
                None => {
                    let error = format!("cmid:{source}(copy {copy} is missing after duplication)");
                    self.record_duplicate_failure(course, source, error, &mut outcome);
                    continue;
                }
            };
            if let Err(e) = self.services.relocator.relocate(copy, destination) {
                self.record_duplicate_failure(course, source, format!("cmid:{source}({e})"), &mut outcome);
            }
        }

        info!(
            course,
            duplicated = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "modules duplicated"
        );
        self.emit(&BulkEvent::ModulesDuplicated {
            course,
            target_course: course,
            duplicated: outcome.duplicated(),
            failed: outcome.failed_ids(),
        });
        Ok(outcome)
    }

    pub(super) fn record_clone_failure(
        &self,
        course: CourseId,
        item: ItemId,
        err: &CloneError,
        outcome: &mut BatchOutcome,
    ) {
        self.record_duplicate_failure(course, item, format!("cmid:{item}({err})"), outcome);
    }

    /// Fail every requested id that the structure no longer lists
    pub(super) fn record_missing(
        &self,
        course: CourseId,
        requested: &[ItemId],
        present: &[ItemId],
        outcome: &mut BatchOutcome,
    ) {
        for &id in requested.iter().filter(|id| !present.contains(id)) {
            let error = format!("cmid:{id}(no longer part of the course)");
            self.record_duplicate_failure(course, id, error, outcome);
        }
    }

    /// Log, emit and record a failed duplication. A source that already
    /// produced a copy loses its success entry.
    pub(super) fn record_duplicate_failure(
        &self,
        course: CourseId,
        item: ItemId,
        error: String,
        outcome: &mut BatchOutcome,
    ) {
        warn!(course, item, %error, "duplication failed");
        self.emit(&BulkEvent::ModuleDuplicationFailed {
            course,
            item,
            error: error.clone(),
        });
        outcome.demote(item, error);
    }
}
