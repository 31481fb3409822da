//! Availability of modules

use tracing::debug;

use super::core::{BatchOutcome, BulkVerb};
use super::error::BulkResult;
use super::executor::{BulkExecutor, batch_scope};
use crate::course::{Item, ItemChanges};
use crate::events::BulkEvent;

impl BulkExecutor<'_> {
    /// Show or hide modules.
    ///
    /// `visible && !visible_on_page` asks for "available but not shown on
    /// the course page". Without the stealth feature such modules are
    /// skipped. In a hidden section the request is the same as showing
    /// the module, since it cannot appear on the page anyway.
    ///
    /// # Errors
    /// Returns `BulkError::NotFound` if a module is no longer in the course.
    /// A module that cannot be read is recorded as failed.
    pub fn set_visibility(
        &self,
        items: &[Item],
        visible: bool,
        visible_on_page: bool,
    ) -> BulkResult<BatchOutcome> {
        let Some((course, ids)) = batch_scope(items)? else {
            return Ok(BatchOutcome::new());
        };
        let snapshot = self.snapshot(course, &ids)?;
        self.require_present(&snapshot, &ids)?;

        let stealth = visible && !visible_on_page;
        let repo = self.services.repository;
        let mut outcome = BatchOutcome::new();
        for p in &snapshot.order {
            let on_page = if !visible {
                true
            } else if stealth {
                if !self.settings.allow_stealth {
                    debug!(course, item = p.item, "stealth modules disabled, skipping");
                    outcome.add_skip(p.item);
                    continue;
                }
                !snapshot.section(p.section).is_some_and(|s| s.visible)
            } else {
                true
            };

            let item = match repo.item(p.item) {
                Ok(item) => item,
                Err(e) => {
                    outcome.add_failure(p.item, e.to_string());
                    continue;
                }
            };
            if item.visible == visible && item.visible_on_page == on_page {
                outcome.add_success(p.item, p.item);
                continue;
            }
            let changes = ItemChanges {
                visible: Some(visible),
                visible_on_page: Some(on_page),
                ..ItemChanges::default()
            };
            match repo.update_item(p.item, &changes) {
                Ok(()) => {
                    outcome.add_success(p.item, p.item);
                    self.emit(&BulkEvent::ModuleUpdated { course, item: p.item });
                }
                Err(e) => outcome.add_failure(p.item, e.to_string()),
            }
        }

        self.complete(course, BulkVerb::SetVisibility, &outcome);
        Ok(outcome)
    }
}
