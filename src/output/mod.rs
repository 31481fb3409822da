//! Output formatting for CLI display
//!
//! Formats modules, courses and bulk action outcomes for the terminal.
//! Plain variants (no decoration) are used in quiet mode.

use colored::Colorize;

use crate::bulk::{BatchOutcome, BulkVerb};
use crate::course::{Course, Item};
use crate::events::EventEnvelope;
use crate::tasks::TaskDescriptor;

/// Format a module for listings
#[must_use]
pub fn item_line(item: &Item, selectable: bool, quiet: bool) -> String {
    if quiet {
        return item.id.to_string();
    }
    let mut flags = Vec::new();
    if !item.visible {
        flags.push("hidden");
    } else if !item.visible_on_page {
        flags.push("stealth");
    }
    if item.show_description {
        flags.push("description");
    }
    if !selectable {
        flags.push("locked");
    }
    let indent = "  ".repeat(usize::from(item.indent));
    let line = format!("{indent}{:>5}  {} ({})", item.id, item.name, item.kind);
    let line = if flags.is_empty() {
        line
    } else {
        format!("{line} [{}]", flags.join(", "))
    };
    if item.visible {
        line
    } else {
        line.dimmed().to_string()
    }
}

/// Format a course for listings
#[must_use]
pub fn course_line(course: &Course, quiet: bool) -> String {
    if quiet {
        course.id.to_string()
    } else {
        format!(
            "  {:>5}  {} ({} sections)",
            course.id,
            course.name,
            course.last_section() + 1
        )
    }
}

/// One-line description of a queued task
#[must_use]
pub fn task_line(id: u64, task: &TaskDescriptor) -> String {
    match task {
        TaskDescriptor::Duplicate {
            course,
            items,
            section,
        } => {
            let target = section.map_or_else(|| "original sections".to_string(), |s| format!("section {s}"));
            format!("  {id}  {}  course {course}: {} module(s) to {target}", task.kind(), items.len())
        }
        TaskDescriptor::ContentNotification {
            item,
            course,
            user_from,
            ..
        } => format!("  {id}  {}  course {course}: module {item} from user {user_from}", task.kind()),
    }
}

/// One-line description of a logged event
#[must_use]
pub fn event_line(envelope: &EventEnvelope) -> String {
    let payload = serde_json::to_string(&envelope.event).unwrap_or_default();
    format!(
        "{} {} {}",
        envelope.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
        envelope.event.name().cyan(),
        payload
    )
}

/// Print the summary of a bulk action
pub fn print_outcome(verb: BulkVerb, outcome: &BatchOutcome) {
    println!("\n{}", format!("=== {verb} Summary ===").bold());
    println!("  {} {}", "✓ Success:".green(), outcome.succeeded.len());
    if verb == BulkVerb::Duplicate || verb == BulkVerb::DuplicateToCourse {
        for (source, copy) in &outcome.succeeded {
            println!("    {source} -> {copy}");
        }
    }
    if !outcome.skipped.is_empty() {
        println!("  {} {}", "⊘ Skipped:".yellow(), outcome.skipped.len());
    }
    if outcome.has_failures() {
        println!("  {} {}", "✗ Errors:".red(), outcome.failed.len());
        println!("\n{}", "Error details:".red().bold());
        for (item, msg) in &outcome.failed {
            println!("  - {item}: {msg}");
        }
    }
}

/// JSON document for `--json` output
///
/// # Errors
/// Returns `serde_json::Error` if the outcome cannot be serialized.
pub fn outcome_json(verb: BulkVerb, outcome: &BatchOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&serde_json::json!({
        "verb": verb,
        "outcome": outcome,
    }))
}
