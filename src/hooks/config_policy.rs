//! Listeners driven by the `[policy]` table of the configuration

use super::HookRegistry;
use crate::config::PolicyConfig;

/// Register section and selection listeners enforcing `policy`.
///
/// Nothing is registered for settings left at their permissive defaults.
pub fn register_config_policy(hooks: &mut HookRegistry, policy: &PolicyConfig) {
    if !policy.restricted_sections.is_empty() {
        let restricted = policy.restricted_sections.clone();
        hooks.on_filter_sections(move |request| {
            request.retain_sections(|num| !restricted.contains(&num));
        });
    }

    if !policy.keep_origin_section || !policy.allow_section_creation {
        let keep_origin = policy.keep_origin_section;
        let allow_creation = policy.allow_section_creation;
        hooks.on_filter_sections(move |request| {
            if !keep_origin {
                request.disable_origin_section();
            }
            if !allow_creation {
                request.disable_make_section();
            }
        });
    }

    if !policy.unselectable_kinds.is_empty() {
        let kinds = policy.unselectable_kinds.clone();
        hooks.on_filter_selection(move |request| {
            request.retain(|item| !kinds.contains(&item.kind));
        });
    }
}
