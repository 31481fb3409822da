//! Deferred units of work handed to an external task queue
//!
//! Long duplication batches and content notifications are not executed
//! inline. They are described by a [`TaskDescriptor`] and queued; retries
//! and delivery guarantees belong to the queue, not to this crate.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::course::{CourseId, ItemId, SectionNum, StoreResult};

/// A queued unit of work
#[derive(Encode, Decode, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum TaskDescriptor {
    /// Duplicate modules of one course, optionally into a fixed section
    Duplicate {
        course: CourseId,
        items: Vec<ItemId>,
        section: Option<SectionNum>,
    },
    /// Tell course participants that a module changed
    ContentNotification {
        /// `true` reads "module updated" rather than "module added"
        update: bool,
        item: ItemId,
        course: CourseId,
        user_from: u64,
    },
}

impl TaskDescriptor {
    /// Short task kind for listings and logs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Duplicate { .. } => "duplicate",
            Self::ContentNotification { .. } => "content_notification",
        }
    }
}

/// External queue of deferred tasks
pub trait TaskQueue {
    /// Queue a task. With `allow_duplicates == false` an identical pending
    /// task suppresses the new one.
    ///
    /// Returns `true` if the task was queued.
    ///
    /// # Errors
    /// Returns `StoreError` if the queue cannot be written.
    fn enqueue(&self, task: TaskDescriptor, allow_duplicates: bool) -> StoreResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_kind() {
        let task = TaskDescriptor::Duplicate {
            course: 3,
            items: vec![1, 2],
            section: None,
        };
        assert_eq!(task.kind(), "duplicate");
    }

    #[test]
    fn test_task_bincode_round_trip() {
        let task = TaskDescriptor::ContentNotification {
            update: true,
            item: 5,
            course: 2,
            user_from: 7,
        };
        let bytes = bincode::encode_to_vec(&task, bincode::config::standard()).unwrap();
        let (back, _): (TaskDescriptor, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(back, task);
    }
}
