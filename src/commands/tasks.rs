//! Deferred task and event log commands

use colored::Colorize;
use tracing::{info, warn};

use super::Session;
use crate::bulk::TaskReport;
use crate::course::CourseId;
use crate::{MassactError, Result, output};

/// # Errors
/// Returns `MassactError::DbError` if the queue cannot be read.
pub fn list(session: &Session<'_>) -> Result<()> {
    let tasks = session.db.pending_tasks()?;
    if tasks.is_empty() {
        if !session.quiet {
            println!("No pending tasks.");
        }
        return Ok(());
    }
    for (id, task) in &tasks {
        if session.quiet {
            println!("{id}");
        } else {
            println!("{}", output::task_line(*id, task));
        }
    }
    Ok(())
}

/// Run one pending task, or all of them
///
/// A task that fails stays queued so it can be retried.
///
/// # Errors
/// Returns `MassactError` if the queue cannot be read or an explicitly
/// requested task is unknown.
pub fn run(session: &Session<'_>, only: Option<u64>) -> Result<()> {
    let mut tasks = session.db.pending_tasks()?;
    if let Some(id) = only {
        tasks.retain(|(task_id, _)| *task_id == id);
        if tasks.is_empty() {
            return Err(MassactError::InvalidInput(format!("No pending task with id {id}")));
        }
    }

    let exec = session.executor();
    let mut failures = 0usize;
    for (id, task) in &tasks {
        match exec.run_task(task) {
            Ok(report) => {
                session.db.complete_task(*id)?;
                info!(task = id, kind = task.kind(), "task completed");
                if session.quiet {
                    continue;
                }
                match report {
                    TaskReport::Duplicated(outcome) => {
                        println!("Task {id}:");
                        output::print_outcome(crate::bulk::BulkVerb::Duplicate, &outcome);
                    }
                    TaskReport::NotificationReleased {
                        course,
                        item,
                        user_from,
                    } => println!(
                        "Task {id}: notified course {course} about module {item} (from user {user_from})"
                    ),
                }
            }
            Err(e) => {
                failures += 1;
                warn!(task = id, kind = task.kind(), error = %e, "task failed, keeping it queued");
                if !session.quiet {
                    eprintln!("{} task {id}: {e}", "✗".red());
                }
            }
        }
    }

    if !session.quiet && !tasks.is_empty() {
        println!(
            "\n{} of {} task(s) completed",
            tasks.len() - failures,
            tasks.len()
        );
    }
    Ok(())
}

/// # Errors
/// Returns `MassactError::DbError` if the log cannot be read.
pub fn events(session: &Session<'_>, course: Option<CourseId>) -> Result<()> {
    let events = session.db.events(course)?;
    if session.json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }
    if events.is_empty() && !session.quiet {
        println!("No events recorded.");
    }
    for envelope in &events {
        println!("{}", output::event_line(envelope));
    }
    Ok(())
}
