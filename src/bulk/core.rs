use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::course::{ItemId, SectionNum};
use crate::events::DuplicatedModule;

/// Bulk verb (used in events and summaries)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkVerb {
    Duplicate,
    DuplicateToCourse,
    Delete,
    Move,
    SetVisibility,
    AdjustIndentation,
    SetDescription,
    NotifyContentChanged,
}

impl BulkVerb {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Duplicate => "Duplicate",
            Self::DuplicateToCourse => "Duplicate To Course",
            Self::Delete => "Delete",
            Self::Move => "Move",
            Self::SetVisibility => "Visibility",
            Self::AdjustIndentation => "Indentation",
            Self::SetDescription => "Description",
            Self::NotifyContentChanged => "Content Changed Notification",
        }
    }
}

impl fmt::Display for BulkVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Engine settings that come from site configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkSettings {
    /// Site-wide stealth-activity feature flag
    pub allow_stealth: bool,
    /// Highest section number that may be created
    pub max_sections: SectionNum,
    /// Principal recorded as sender of notifications
    pub acting_user: u64,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            allow_stealth: false,
            max_sections: crate::config::DEFAULT_MAX_SECTIONS,
            acting_user: crate::config::DEFAULT_ACTING_USER,
        }
    }
}

/// Per-item results of one bulk action.
///
/// Every processed item lands in exactly one of `succeeded`, `failed` or
/// `skipped`. For duplication the second id of a success is the copy; for
/// every other verb it repeats the source id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<(ItemId, ItemId)>,
    pub failed: BTreeMap<ItemId, String>,
    pub skipped: Vec<ItemId>,
}

impl BatchOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, source: ItemId, produced: ItemId) {
        self.succeeded.push((source, produced));
    }

    pub fn add_failure(&mut self, item: ItemId, msg: String) {
        self.failed.insert(item, msg);
    }

    pub fn add_skip(&mut self, item: ItemId) {
        self.skipped.push(item);
    }

    /// Move a previously successful item to the failures
    pub fn demote(&mut self, source: ItemId, msg: String) {
        self.succeeded.retain(|(s, _)| *s != source);
        self.add_failure(source, msg);
    }

    /// Ids of items produced by the action, in processing order
    #[must_use]
    pub fn produced(&self) -> Vec<ItemId> {
        self.succeeded.iter().map(|(_, p)| *p).collect()
    }

    #[must_use]
    pub fn succeeded_sources(&self) -> Vec<ItemId> {
        self.succeeded.iter().map(|(s, _)| *s).collect()
    }

    #[must_use]
    pub fn failed_ids(&self) -> Vec<ItemId> {
        self.failed.keys().copied().collect()
    }

    #[must_use]
    pub fn duplicated(&self) -> Vec<DuplicatedModule> {
        self.succeeded
            .iter()
            .map(|&(source, copy)| DuplicatedModule { source, copy })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && self.failed.is_empty() && self.skipped.is_empty()
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}
