//! Content change notifications

use tracing::debug;

use super::core::{BatchOutcome, BulkVerb};
use super::error::BulkResult;
use super::executor::{BulkExecutor, batch_scope};
use crate::course::Item;
use crate::tasks::TaskDescriptor;

impl BulkExecutor<'_> {
    /// Queue "module updated" notifications for visible modules of a
    /// visible course. Hidden modules are skipped; a notification already
    /// pending for a module counts as sent.
    ///
    /// # Errors
    /// Returns `BulkError::NotFound` if the course or a module is missing.
    /// A module that cannot be read is recorded as failed.
    pub fn notify_content_changed(&self, items: &[Item]) -> BulkResult<BatchOutcome> {
        let Some((course, ids)) = batch_scope(items)? else {
            return Ok(BatchOutcome::new());
        };
        let repo = self.services.repository;
        let record = repo.course(course)?;
        let snapshot = self.snapshot(course, &ids)?;
        self.require_present(&snapshot, &ids)?;

        let mut outcome = BatchOutcome::new();
        for p in &snapshot.order {
            let item = match repo.item(p.item) {
                Ok(item) => item,
                Err(e) => {
                    outcome.add_failure(p.item, e.to_string());
                    continue;
                }
            };
            if !record.visible || !item.visible {
                debug!(course, item = p.item, "hidden, no notification");
                outcome.add_skip(p.item);
                continue;
            }
            let task = TaskDescriptor::ContentNotification {
                update: true,
                item: p.item,
                course,
                user_from: self.settings.acting_user,
            };
            match self.services.tasks.enqueue(task, false) {
                Ok(_) => outcome.add_success(p.item, p.item),
                Err(e) => outcome.add_failure(p.item, e.to_string()),
            }
        }

        self.complete(course, BulkVerb::NotifyContentChanged, &outcome);
        Ok(outcome)
    }
}
