//! Policy filter gateway
//!
//! External policies (quiz locks, per-site restrictions, ...) plug into bulk
//! actions by registering listeners here. Listeners run synchronously in
//! registration order and may only narrow what they are given. With no
//! listeners every candidate is allowed.
//!
//! Decisions are computed fresh for every batch and never cached.

mod config_policy;
mod sections;
mod selection;

pub use config_policy::register_config_policy;
pub use sections::{FilterMode, PolicyDecision, SectionFilter};
pub use selection::SelectionFilter;

use std::fmt;

use tracing::debug;

use crate::course::{CourseId, Item, ItemId, SectionNum};

/// Listener narrowing the sections eligible for an operation
pub type SectionListener = Box<dyn Fn(&mut SectionFilter)>;

/// Listener narrowing the modules eligible for selection
pub type SelectionListener = Box<dyn Fn(&mut SelectionFilter)>;

/// Ordered registry of policy listeners
#[derive(Default)]
pub struct HookRegistry {
    section_listeners: Vec<SectionListener>,
    selection_listeners: Vec<SelectionListener>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for section filtering
    pub fn on_filter_sections(&mut self, listener: impl Fn(&mut SectionFilter) + 'static) {
        self.section_listeners.push(Box::new(listener));
    }

    /// Register a listener for module selection filtering
    pub fn on_filter_selection(&mut self, listener: impl Fn(&mut SelectionFilter) + 'static) {
        self.selection_listeners.push(Box::new(listener));
    }

    /// Dispatch a section filter request and return the resulting decision
    #[must_use]
    pub fn filter_sections(
        &self,
        course: CourseId,
        candidates: impl IntoIterator<Item = SectionNum>,
        mode: FilterMode,
    ) -> PolicyDecision {
        let mut request = SectionFilter::new(course, candidates, mode);
        for listener in &self.section_listeners {
            listener(&mut request);
        }
        // Allowed sections stay a subset of the candidates.
        let candidates = request.candidates().clone();
        request.retain_sections(|num| candidates.contains(&num));
        let decision = request.into_decision();
        debug!(
            course,
            ?mode,
            allowed = ?decision.allowed,
            origin = decision.allow_origin_section,
            create = decision.allow_section_creation,
            "section filter resolved"
        );
        decision
    }

    /// Dispatch a selection filter request and return the selectable ids
    #[must_use]
    pub fn filter_selection(&self, course: CourseId, items: Vec<Item>) -> Vec<ItemId> {
        let mut request = SelectionFilter::new(course, items);
        for listener in &self.selection_listeners {
            listener(&mut request);
        }
        request.into_ids()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("section_listeners", &self.section_listeners.len())
            .field("selection_listeners", &self.selection_listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_listeners_is_permissive() {
        let hooks = HookRegistry::new();
        let decision = hooks.filter_sections(1, [0, 1, 2], FilterMode::SameCourse);
        assert_eq!(decision.allowed.len(), 3);
        assert!(decision.allow_origin_section);
        assert!(decision.allow_section_creation);
    }

    #[test]
    fn test_listeners_run_in_registration_order() {
        let mut hooks = HookRegistry::new();
        hooks.on_filter_sections(|req| req.remove_section(1));
        hooks.on_filter_sections(|req| {
            // Sees the first listener's narrowing
            if !req.sections().contains(&1) {
                req.disable_make_section();
            }
        });
        let decision = hooks.filter_sections(1, [0, 1, 2], FilterMode::DifferentCourse);
        assert!(!decision.allows(1));
        assert!(decision.allows(2));
        assert!(!decision.allow_section_creation);
        assert!(decision.allow_origin_section);
    }

    #[test]
    fn test_mode_visible_to_listeners() {
        let mut hooks = HookRegistry::new();
        hooks.on_filter_sections(|req| {
            if req.mode() == FilterMode::DifferentCourse {
                req.disable_origin_section();
            }
        });
        assert!(hooks.filter_sections(1, [0], FilterMode::SameCourse).allow_origin_section);
        assert!(
            !hooks
                .filter_sections(1, [0], FilterMode::DifferentCourse)
                .allow_origin_section
        );
    }

    #[test]
    fn test_selection_filter_removes_kind() {
        let mut hooks = HookRegistry::new();
        hooks.on_filter_selection(|req| req.retain(|item| item.kind != "page"));
        let items = vec![
            Item::new(1, 5, 0, "assign"),
            Item::new(2, 5, 0, "assign"),
            Item::new(3, 5, 1, "page"),
        ];
        let ids = hooks.filter_selection(5, items);
        assert_eq!(ids, vec![1, 2]);
    }
}
