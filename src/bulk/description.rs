//! Display of module descriptions on the course page

use super::core::{BatchOutcome, BulkVerb};
use super::error::BulkResult;
use super::executor::{BulkExecutor, batch_scope};
use crate::course::{CacheScope, Item, ItemChanges};

impl BulkExecutor<'_> {
    /// Show or hide descriptions. Modules without a view page and modules
    /// already in the requested state are skipped without a write.
    ///
    /// # Errors
    /// Returns `BulkError::NotFound` if a module is no longer in the course.
    /// A module that cannot be read is recorded as failed.
    pub fn set_description_visible(&self, items: &[Item], show: bool) -> BulkResult<BatchOutcome> {
        let Some((course, ids)) = batch_scope(items)? else {
            return Ok(BatchOutcome::new());
        };
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
            if !item.has_view || item.show_description == show {
                outcome.add_skip(p.item);
                continue;
            }
            let changes = ItemChanges {
                show_description: Some(show),
                ..ItemChanges::default()
            };
            let written = repo
                .update_item(p.item, &changes)
                .and_then(|()| repo.invalidate_cache(course, CacheScope::Item(p.item)));
            match written {
                Ok(()) => outcome.add_success(p.item, p.item),
                Err(e) => outcome.add_failure(p.item, e.to_string()),
            }
        }

        self.complete(course, BulkVerb::SetDescription, &outcome);
        Ok(outcome)
    }
}
