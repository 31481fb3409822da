//! Events reported by bulk actions
//!
//! Every batch reports exactly one aggregated event when it finishes, plus
//! one event per item whose duplication or deletion failed and one per
//! module whose visibility changed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bulk::BulkVerb;
use crate::course::{CourseId, ItemId};

/// Source and copy of a duplicated module
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuplicatedModule {
    pub source: ItemId,
    pub copy: ItemId,
}

/// Events emitted through an [`EventSink`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BulkEvent {
    ModulesDuplicated {
        course: CourseId,
        target_course: CourseId,
        duplicated: Vec<DuplicatedModule>,
        failed: Vec<ItemId>,
    },
    ModuleDuplicationFailed {
        course: CourseId,
        item: ItemId,
        error: String,
    },
    ModulesDeleted {
        course: CourseId,
        deleted: Vec<ItemId>,
        failed: Vec<ItemId>,
    },
    ModuleDeletionFailed {
        course: CourseId,
        item: ItemId,
        error: String,
    },
    ModuleUpdated {
        course: CourseId,
        item: ItemId,
    },
    BatchCompleted {
        course: CourseId,
        verb: BulkVerb,
        succeeded: Vec<ItemId>,
        failed: Vec<ItemId>,
        skipped: Vec<ItemId>,
    },
}

impl BulkEvent {
    /// Stable event name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ModulesDuplicated { .. } => "course_modules_duplicated",
            Self::ModuleDuplicationFailed { .. } => "course_modules_duplicated_failed",
            Self::ModulesDeleted { .. } => "course_modules_deleted",
            Self::ModuleDeletionFailed { .. } => "course_module_deletion_failed",
            Self::ModuleUpdated { .. } => "course_module_updated",
            Self::BatchCompleted { .. } => "bulk_action_completed",
        }
    }

    /// Course the event is reported against
    #[must_use]
    pub const fn course(&self) -> CourseId {
        match self {
            Self::ModulesDuplicated { course, .. }
            | Self::ModuleDuplicationFailed { course, .. }
            | Self::ModulesDeleted { course, .. }
            | Self::ModuleDeletionFailed { course, .. }
            | Self::ModuleUpdated { course, .. }
            | Self::BatchCompleted { course, .. } => *course,
        }
    }
}

/// Timestamped event as persisted by event logs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventEnvelope {
    pub timestamp: DateTime<Utc>,
    pub event: BulkEvent,
}

impl EventEnvelope {
    #[must_use]
    pub fn now(event: BulkEvent) -> Self {
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Receiver of bulk action events
pub trait EventSink {
    fn emit(&self, event: &BulkEvent);
}

/// Sink writing events to the tracing subscriber as JSON payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &BulkEvent) {
        let payload = serde_json::to_string(event).unwrap_or_else(|e| format!("<unserializable: {e}>"));
        info!(target: "massact::events", name = event.name(), course = event.course(), %payload, "event");
    }
}

/// Sink forwarding every event to several sinks in order
pub struct FanoutSink<'a> {
    sinks: Vec<&'a dyn EventSink>,
}

impl<'a> FanoutSink<'a> {
    #[must_use]
    pub fn new(sinks: Vec<&'a dyn EventSink>) -> Self {
        Self { sinks }
    }
}

impl EventSink for FanoutSink<'_> {
    fn emit(&self, event: &BulkEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}
