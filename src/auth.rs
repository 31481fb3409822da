//! Capability checks consulted by bulk actions
//!
//! The engine only asks yes/no questions; who holds which capability is
//! decided by the implementor of [`AuthorizationOracle`].

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::course::CourseId;

/// Capabilities relevant to bulk course-module actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Export modules out of a course (`moodle/backup:backuptargetimport`)
    BackupTargetImport,
    /// Import modules into a course (`moodle/restore:restoretargetimport`)
    RestoreTargetImport,
    /// Change course settings, including adding sections
    CourseUpdate,
    /// Add, change and remove course modules
    ManageActivities,
}

impl Capability {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BackupTargetImport => "moodle/backup:backuptargetimport",
            Self::RestoreTargetImport => "moodle/restore:restoretargetimport",
            Self::CourseUpdate => "moodle/course:update",
            Self::ManageActivities => "moodle/course:manageactivities",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers capability questions for the acting principal
pub trait AuthorizationOracle {
    fn has_capability(&self, capability: Capability, course: CourseId) -> bool;
}

/// Grants everything except explicitly denied capabilities
#[derive(Debug, Clone, Default)]
pub struct StaticAuthorization {
    denied: HashSet<Capability>,
    denied_in: HashMap<CourseId, HashSet<Capability>>,
}

impl StaticAuthorization {
    /// Authorization that grants every capability everywhere
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Build from a list of globally denied capabilities
    #[must_use]
    pub fn with_denied(denied: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            denied: denied.into_iter().collect(),
            denied_in: HashMap::new(),
        }
    }

    /// Deny a capability in every course
    #[must_use]
    pub fn deny(mut self, capability: Capability) -> Self {
        self.denied.insert(capability);
        self
    }

    /// Deny a capability in one course only
    #[must_use]
    pub fn deny_in(mut self, course: CourseId, capability: Capability) -> Self {
        self.denied_in.entry(course).or_default().insert(capability);
        self
    }
}

impl AuthorizationOracle for StaticAuthorization {
    fn has_capability(&self, capability: Capability, course: CourseId) -> bool {
        if self.denied.contains(&capability) {
            return false;
        }
        !self
            .denied_in
            .get(&course)
            .is_some_and(|caps| caps.contains(&capability))
    }
}
