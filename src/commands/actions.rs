//! Bulk action commands
//!
//! Module ids from the command line are loaded, checked against the
//! selection policy of their course and handed to the executor.

use std::collections::HashSet;

use colored::Colorize;
use dialoguer::Confirm;

use super::Session;
use crate::bulk::{BatchOutcome, BulkVerb, TargetSection};
use crate::course::{CourseId, Item, ItemId, SectionNum};
use crate::{MassactError, Result, output};

/// Load modules and reject those policies keep out of bulk actions
///
/// # Errors
/// Returns `MassactError::InvalidInput` for modules that cannot be selected
/// and `MassactError::DbError` for unknown ids.
pub fn load_selection(session: &Session<'_>, ids: &[ItemId]) -> Result<Vec<Item>> {
    let items = session.db.items_by_id(ids)?;
    let courses: HashSet<CourseId> = items.iter().map(|i| i.course).collect();
    let mut selectable = HashSet::new();
    for course in courses {
        selectable.extend(
            session
                .executor()
                .selectable_items(course)?
                .into_iter()
                .map(|i| i.id),
        );
    }
    if let Some(locked) = items.iter().find(|i| !selectable.contains(&i.id)) {
        return Err(MassactError::InvalidInput(format!(
            "module {} ({}) cannot be selected for bulk actions",
            locked.id, locked.name
        )));
    }
    Ok(items)
}

fn report(session: &Session<'_>, verb: BulkVerb, outcome: &BatchOutcome) -> Result<()> {
    if session.json {
        println!("{}", output::outcome_json(verb, outcome)?);
    } else if session.quiet {
        for id in outcome.produced() {
            println!("{id}");
        }
    } else {
        output::print_outcome(verb, outcome);
    }
    Ok(())
}

/// # Errors
/// Returns `MassactError` if loading the selection or the action fails.
pub fn duplicate(
    session: &Session<'_>,
    ids: &[ItemId],
    section: Option<SectionNum>,
    defer: bool,
) -> Result<()> {
    let items = load_selection(session, ids)?;
    let exec = session.executor();
    if defer {
        let queued = exec.queue_duplicate(&items, section)?;
        if !session.quiet {
            if queued {
                println!("Duplication of {} module(s) queued", items.len());
            } else {
                println!("{}", "An identical duplication is already pending".yellow());
            }
        }
        return Ok(());
    }
    let outcome = exec.duplicate(&items, section)?;
    report(session, BulkVerb::Duplicate, &outcome)
}

/// # Errors
/// Returns `MassactError` if loading the selection or the action fails.
pub fn copy_to(
    session: &Session<'_>,
    target: CourseId,
    ids: &[ItemId],
    section: TargetSection,
) -> Result<()> {
    let items = load_selection(session, ids)?;
    let outcome = session.executor().duplicate_to_course(&items, target, section)?;
    report(session, BulkVerb::DuplicateToCourse, &outcome)
}

/// # Errors
/// Returns `MassactError` if loading the selection or the action fails.
pub fn move_to(session: &Session<'_>, ids: &[ItemId], section: SectionNum) -> Result<()> {
    let items = load_selection(session, ids)?;
    let outcome = session.executor().move_to(&items, section)?;
    report(session, BulkVerb::Move, &outcome)
}

/// Delete modules after listing them and asking for confirmation
///
/// # Errors
/// Returns `MassactError` if validation fails, the prompt cannot be shown,
/// or the action fails.
pub fn delete(session: &Session<'_>, ids: &[ItemId], yes: bool) -> Result<()> {
    let items = load_selection(session, ids)?;
    let exec = session.executor();
    let preview = exec.deletion_preview(&items)?;
    if preview.is_empty() {
        return Ok(());
    }

    if !yes {
        println!("{}", "Modules to delete:".bold());
        for item in &preview {
            println!("  - {} {} ({})", item.id, item.name, item.kind);
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete {} module(s)?", preview.len()))
            .default(false)
            .interact()
            .map_err(|e| MassactError::InvalidInput(format!("Failed to get confirmation: {e}")))?;
        if !confirmed {
            println!("Operation cancelled.");
            return Ok(());
        }
    }

    let outcome = exec.delete(&items)?;
    report(session, BulkVerb::Delete, &outcome)
}

/// # Errors
/// Returns `MassactError` if loading the selection or the action fails.
pub fn visibility(
    session: &Session<'_>,
    ids: &[ItemId],
    visible: bool,
    visible_on_page: bool,
) -> Result<()> {
    let items = load_selection(session, ids)?;
    let outcome = session
        .executor()
        .set_visibility(&items, visible, visible_on_page)?;
    if !session.quiet && !session.settings.allow_stealth && visible && !visible_on_page {
        eprintln!(
            "{}",
            "Stealth modules are disabled; set allow_stealth=true to enable them".yellow()
        );
    }
    report(session, BulkVerb::SetVisibility, &outcome)
}

/// # Errors
/// Returns `MassactError` if loading the selection or the action fails.
pub fn indent(session: &Session<'_>, ids: &[ItemId], delta: i8) -> Result<()> {
    let items = load_selection(session, ids)?;
    let outcome = session.executor().adjust_indentation(&items, delta)?;
    report(session, BulkVerb::AdjustIndentation, &outcome)
}

/// # Errors
/// Returns `MassactError` if loading the selection or the action fails.
pub fn description(session: &Session<'_>, ids: &[ItemId], show: bool) -> Result<()> {
    let items = load_selection(session, ids)?;
    let outcome = session.executor().set_description_visible(&items, show)?;
    report(session, BulkVerb::SetDescription, &outcome)
}

/// # Errors
/// Returns `MassactError` if loading the selection or the action fails.
pub fn notify(session: &Session<'_>, ids: &[ItemId]) -> Result<()> {
    let items = load_selection(session, ids)?;
    let outcome = session.executor().notify_content_changed(&items)?;
    report(session, BulkVerb::NotifyContentChanged, &outcome)
}
