//! The bulk operation executor
//!
//! Each verb lives in its own module as an `impl BulkExecutor` block. They
//! share the same shape: derive the batch scope, read the live course
//! structure, check batch-level preconditions, then walk the selection in
//! course order and collect per-item results into a [`BatchOutcome`].

use std::collections::HashSet;

use tracing::{debug, info};

use super::capacity::SectionCapacity;
use super::core::{BatchOutcome, BulkSettings, BulkVerb};
use super::error::{BulkError, BulkResult};
use super::order::{self, Snapshot};
use crate::auth::{AuthorizationOracle, Capability};
use crate::course::{
    CourseId, CourseRepository, Entity, Item, ItemCloner, ItemId, ItemRelocator, SectionNum,
};
use crate::events::{BulkEvent, EventSink};
use crate::hooks::{FilterMode, HookRegistry, PolicyDecision};
use crate::tasks::{TaskDescriptor, TaskQueue};

/// Collaborators the executor works through
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub repository: &'a dyn CourseRepository,
    pub cloner: &'a dyn ItemCloner,
    pub relocator: &'a dyn ItemRelocator,
    pub authorization: &'a dyn AuthorizationOracle,
    pub hooks: &'a HookRegistry,
    pub tasks: &'a dyn TaskQueue,
    pub events: &'a dyn EventSink,
}

impl<'a> Services<'a> {
    /// Wire a store that provides every course primitive and the task queue
    #[must_use]
    pub fn from_store<S>(
        store: &'a S,
        authorization: &'a dyn AuthorizationOracle,
        hooks: &'a HookRegistry,
        events: &'a dyn EventSink,
    ) -> Self
    where
        S: CourseRepository + ItemCloner + ItemRelocator + TaskQueue,
    {
        Self {
            repository: store,
            cloner: store,
            relocator: store,
            authorization,
            hooks,
            tasks: store,
            events,
        }
    }
}

/// What running a deferred task produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskReport {
    Duplicated(BatchOutcome),
    /// Notification handed over for delivery
    NotificationReleased {
        course: CourseId,
        item: ItemId,
        user_from: u64,
    },
}

/// Applies bulk verbs to selections of course modules
pub struct BulkExecutor<'a> {
    pub(super) services: Services<'a>,
    pub(super) settings: BulkSettings,
}

impl<'a> BulkExecutor<'a> {
    #[must_use]
    pub const fn new(services: Services<'a>, settings: BulkSettings) -> Self {
        Self { services, settings }
    }

    #[must_use]
    pub const fn settings(&self) -> &BulkSettings {
        &self.settings
    }

    /// Selection ids in course display order
    ///
    /// # Errors
    /// Returns `BulkError::NotFound` if the course does not exist.
    pub fn resolve_order(&self, course: CourseId, ids: &[ItemId]) -> BulkResult<Vec<ItemId>> {
        order::resolve_order(self.services.repository, course, ids)
    }

    /// Modules of a course that policies allow to be selected, in course order
    ///
    /// # Errors
    /// Returns `BulkError::NotFound` if the course or one of its modules is missing.
    pub fn selectable_items(&self, course: CourseId) -> BulkResult<Vec<Item>> {
        let repo = self.services.repository;
        let items = repo
            .sections(course)?
            .iter()
            .flat_map(|s| s.items.iter().copied())
            .map(|id| repo.item(id))
            .collect::<Result<Vec<_>, _>>()?;
        let allowed: HashSet<ItemId> = self
            .services
            .hooks
            .filter_selection(course, items.clone())
            .into_iter()
            .collect();
        Ok(items.into_iter().filter(|i| allowed.contains(&i.id)).collect())
    }

    /// Queue a same-course duplication for later execution
    ///
    /// Returns `false` when the selection is empty or an identical task is
    /// already pending.
    ///
    /// # Errors
    /// Returns `BulkError::Validation` for mixed-course selections and
    /// `BulkError::Store` if the queue cannot be written.
    pub fn queue_duplicate(&self, items: &[Item], section: Option<SectionNum>) -> BulkResult<bool> {
        let Some((course, ids)) = batch_scope(items)? else {
            return Ok(false);
        };
        let task = TaskDescriptor::Duplicate {
            course,
            items: ids,
            section,
        };
        let queued = self.services.tasks.enqueue(task, false)?;
        info!(course, queued, "duplication deferred");
        Ok(queued)
    }

    /// Execute a deferred task
    ///
    /// # Errors
    /// Returns any batch-level error of the underlying verb.
    pub fn run_task(&self, task: &TaskDescriptor) -> BulkResult<TaskReport> {
        match task {
            TaskDescriptor::Duplicate {
                course,
                items,
                section,
            } => self
                .duplicate_in_course(*course, items, *section)
                .map(TaskReport::Duplicated),
            TaskDescriptor::ContentNotification {
                course,
                item,
                user_from,
                ..
            } => Ok(TaskReport::NotificationReleased {
                course: *course,
                item: *item,
                user_from: *user_from,
            }),
        }
    }

    pub(super) fn capacity(&self) -> SectionCapacity<'a> {
        SectionCapacity::new(self.services.repository, self.settings.max_sections)
    }

    pub(super) fn snapshot(&self, course: CourseId, ids: &[ItemId]) -> BulkResult<Snapshot> {
        Snapshot::read(self.services.repository, course, ids)
    }

    pub(super) fn decision(
        &self,
        course: CourseId,
        sections: Vec<SectionNum>,
        mode: FilterMode,
    ) -> PolicyDecision {
        self.services.hooks.filter_sections(course, sections, mode)
    }

    pub(super) fn require(&self, capability: Capability, course: CourseId) -> BulkResult<()> {
        if self.services.authorization.has_capability(capability, course) {
            Ok(())
        } else {
            Err(BulkError::Authorization { capability, course })
        }
    }

    pub(super) fn require_course(&self, course: CourseId) -> BulkResult<()> {
        if self.services.repository.course_exists(course)? {
            Ok(())
        } else {
            Err(BulkError::not_found(Entity::Course, course))
        }
    }

    /// Fail with `NotFound` for the first requested module not in the course
    pub(super) fn require_present(&self, snapshot: &Snapshot, ids: &[ItemId]) -> BulkResult<()> {
        match snapshot.first_missing(ids) {
            Some(id) => Err(BulkError::not_found(Entity::Item, id)),
            None => Ok(()),
        }
    }

    pub(super) fn emit(&self, event: &BulkEvent) {
        self.services.events.emit(event);
    }

    /// Emit the aggregated event of a non-duplicating verb
    pub(super) fn complete(&self, course: CourseId, verb: BulkVerb, outcome: &BatchOutcome) {
        debug!(
            course,
            %verb,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            skipped = outcome.skipped.len(),
            "bulk action finished"
        );
        self.emit(&BulkEvent::BatchCompleted {
            course,
            verb,
            succeeded: outcome.succeeded_sources(),
            failed: outcome.failed_ids(),
            skipped: outcome.skipped.clone(),
        });
    }
}

/// Course and ids of a selection; `None` for an empty selection.
///
/// # Errors
/// Returns `BulkError::Validation` if the items span several courses.
pub fn batch_scope(items: &[Item]) -> BulkResult<Option<(CourseId, Vec<ItemId>)>> {
    let Some(first) = items.first() else {
        return Ok(None);
    };
    let course = first.course;
    if let Some(other) = items.iter().find(|i| i.course != course) {
        return Err(BulkError::Validation(format!(
            "module {} belongs to course {} but the selection is in course {course}",
            other.id, other.course
        )));
    }
    let mut seen = HashSet::new();
    let ids = items
        .iter()
        .map(|i| i.id)
        .filter(|id| seen.insert(*id))
        .collect();
    Ok(Some((course, ids)))
}
