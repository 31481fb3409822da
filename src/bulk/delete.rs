//! Deletion of modules

use tracing::{info, warn};

use super::core::BatchOutcome;
use super::error::{BulkError, BulkResult};
use super::executor::{BulkExecutor, batch_scope};
use crate::auth::Capability;
use crate::course::{Entity, Item, StoreError};
use crate::events::BulkEvent;

impl BulkExecutor<'_> {
    /// Modules a delete of `items` would remove, in course order.
    ///
    /// Runs every check of [`delete`](Self::delete) without deleting.
    ///
    /// # Errors
    /// Same validation errors as [`delete`](Self::delete).
    pub fn deletion_preview(&self, items: &[Item]) -> BulkResult<Vec<Item>> {
        let Some((course, ids)) = batch_scope(items)? else {
            return Ok(Vec::new());
        };
        let snapshot = self.snapshot(course, &ids)?;
        self.require_present(&snapshot, &ids)?;

        let repo = self.services.repository;
        let mut validated = Vec::with_capacity(ids.len());
        for p in &snapshot.order {
            let item = repo.item(p.item)?;
            if !repo.course_exists(item.course)? {
                return Err(BulkError::not_found(Entity::Course, item.course));
            }
            self.require(Capability::ManageActivities, item.course)?;
            validated.push(item);
        }
        Ok(validated)
    }

    /// Delete modules.
    ///
    /// Every module is validated before the first one is deleted. Failures
    /// of the delete primitive itself are recorded per module.
    ///
    /// # Errors
    /// Returns `BulkError::NotFound` or `BulkError::Authorization` if any
    /// module fails validation; nothing is deleted then.
    pub fn delete(&self, items: &[Item]) -> BulkResult<BatchOutcome> {
        let validated = self.deletion_preview(items)?;
        let mut outcome = BatchOutcome::new();
        let Some(course) = validated.first().map(|i| i.course) else {
            return Ok(outcome);
        };

        for item in &validated {
            match self.services.repository.delete_item(item.id) {
                Ok(()) => outcome.add_success(item.id, item.id),
                Err(e) => {
                    warn!(course, item = item.id, error = %e, "module deletion failed");
                    self.record_delete_failure(item, &e, &mut outcome);
                }
            }
        }

        info!(
            course,
            deleted = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "modules deleted"
        );
        self.emit(&BulkEvent::ModulesDeleted {
            course,
            deleted: outcome.succeeded_sources(),
            failed: outcome.failed_ids(),
        });
        Ok(outcome)
    }

    fn record_delete_failure(&self, item: &Item, err: &StoreError, outcome: &mut BatchOutcome) {
        let error = err.to_string();
        self.emit(&BulkEvent::ModuleDeletionFailed {
            course: item.course,
            item: item.id,
            error: error.clone(),
        });
        outcome.add_failure(item.id, error);
    }
}
