//! Indentation of modules

use tracing::debug;

use super::core::{BatchOutcome, BulkVerb};
use super::error::{BulkError, BulkResult};
use super::executor::{BulkExecutor, batch_scope};
use crate::course::{CacheScope, Item, ItemChanges, MAX_INDENT, MIN_INDENT};

impl BulkExecutor<'_> {
    /// Indent (`+1`) or outdent (`-1`) modules.
    ///
    /// Modules that would leave `MIN_INDENT..=MAX_INDENT` are skipped. The
    /// course cache is rebuilt once after the batch.
    ///
    /// # Errors
    /// Returns `BulkError::Validation` for any other delta and
    /// `BulkError::NotFound` if a module is no longer in the course.
    /// A module that cannot be read is recorded as failed.
    pub fn adjust_indentation(&self, items: &[Item], delta: i8) -> BulkResult<BatchOutcome> {
        let Some((course, ids)) = batch_scope(items)? else {
            return Ok(BatchOutcome::new());
        };
        if delta != 1 && delta != -1 {
            return Err(BulkError::Validation(format!(
                "indentation changes by 1 or -1, got {delta}"
            )));
        }
        let snapshot = self.snapshot(course, &ids)?;
        self.require_present(&snapshot, &ids)?;

        let repo = self.services.repository;
        let mut outcome = BatchOutcome::new();
        for p in &snapshot.order {
            let item = match repo.item(p.item) {
                Ok(item) => item,
                Err(e) => {
                    outcome.add_failure(p.item, e.to_string());
                    continue;
                }
            };
            let Some(indent) = item
                .indent
                .checked_add_signed(delta)
                .filter(|i| (MIN_INDENT..=MAX_INDENT).contains(i))
            else {
                debug!(course, item = p.item, indent = item.indent, "indent out of range");
                outcome.add_skip(p.item);
                continue;
            };
            let changes = ItemChanges {
                indent: Some(indent),
                ..ItemChanges::default()
            };
            match repo.update_item(p.item, &changes) {
                Ok(()) => outcome.add_success(p.item, p.item),
                Err(e) => outcome.add_failure(p.item, e.to_string()),
            }
        }

        repo.invalidate_cache(course, CacheScope::Course)?;
        self.complete(course, BulkVerb::AdjustIndentation, &outcome);
        Ok(outcome)
    }
}
