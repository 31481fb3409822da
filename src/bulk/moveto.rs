//! Moving modules to another section of their course

use tracing::{info, warn};

use super::core::{BatchOutcome, BulkVerb};
use super::error::{BulkError, BulkResult};
use super::executor::{BulkExecutor, batch_scope};
use crate::course::{Entity, Item, SectionNum};
use crate::hooks::FilterMode;

impl BulkExecutor<'_> {
    /// Move modules to the end of `section`, keeping their course order.
    ///
    /// # Errors
    /// Returns `BulkError::NotFound` for a missing destination section or
    /// module, and `BulkError::RestrictedSection` if any module sits in a
    /// section policies exclude. Nothing is moved in either case.
    pub fn move_to(&self, items: &[Item], section: SectionNum) -> BulkResult<BatchOutcome> {
        let Some((course, ids)) = batch_scope(items)? else {
            return Ok(BatchOutcome::new());
        };
        self.require_course(course)?;

        let snapshot = self.snapshot(course, &ids)?;
        let decision = self.decision(course, snapshot.section_numbers(), FilterMode::SameCourse);
        if snapshot.section(section).is_none() {
            return Err(BulkError::not_found(Entity::Section, u64::from(section)));
        }
        self.require_present(&snapshot, &ids)?;
        if let Some(p) = snapshot.order.iter().find(|p| !decision.allows(p.section)) {
            return Err(BulkError::RestrictedSection {
                course,
                section: p.section,
            });
        }

        let mut outcome = BatchOutcome::new();
        for p in &snapshot.order {
            match self.services.relocator.relocate(p.item, section) {
                Ok(()) => outcome.add_success(p.item, p.item),
                Err(e) => {
                    warn!(course, item = p.item, error = %e, "could not move module");
                    outcome.add_failure(p.item, e.to_string());
                }
            }
        }

        info!(course, section, moved = outcome.succeeded.len(), "modules moved");
        self.complete(course, BulkVerb::Move, &outcome);
        Ok(outcome)
    }
}
