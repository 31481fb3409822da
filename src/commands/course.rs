//! Course and module management commands

use std::collections::HashSet;

use colored::Colorize;

use super::Session;
use crate::course::{CourseId, SectionNum};
use crate::{Result, output};

/// # Errors
/// Returns `MassactError::DbError` if the course cannot be stored.
pub fn create(session: &Session<'_>, name: &str, last_section: SectionNum) -> Result<()> {
    let course = session.db.create_course(name, last_section)?;
    if session.quiet {
        println!("{}", course.id);
    } else {
        println!("Created course {} '{}'", course.id, course.name);
    }
    Ok(())
}

/// # Errors
/// Returns `MassactError::DbError` if the courses cannot be read.
pub fn list_courses(session: &Session<'_>) -> Result<()> {
    let courses = session.db.list_courses()?;
    if courses.is_empty() && !session.quiet {
        println!("No courses yet. Create one with: massact course create <name>");
    }
    for course in &courses {
        println!("{}", output::course_line(course, session.quiet));
    }
    Ok(())
}

/// # Errors
/// Returns `MassactError::DbError` if the course or section does not exist.
pub fn add_item(
    session: &Session<'_>,
    course: CourseId,
    section: SectionNum,
    kind: &str,
    name: &str,
) -> Result<()> {
    let item = session.db.add_item(course, section, kind, name)?;
    if session.quiet {
        println!("{}", item.id);
    } else {
        println!("Added module {} to section {section} of course {course}", item.id);
    }
    Ok(())
}

/// Print a course section by section, marking modules policies lock
///
/// # Errors
/// Returns `MassactError` if the course or one of its modules is missing.
pub fn show(session: &Session<'_>, course: CourseId) -> Result<()> {
    let record = session.db.get_course(course)?.ok_or_else(|| {
        crate::MassactError::InvalidInput(format!("Course {course} does not exist"))
    })?;
    let selectable: HashSet<_> = session
        .executor()
        .selectable_items(course)?
        .into_iter()
        .map(|i| i.id)
        .collect();
    let items = session.db.course_items(course)?;

    if !session.quiet {
        println!("{}", format!("{} (course {})", record.name, record.id).bold());
    }
    for section in &record.sections {
        if !session.quiet {
            let mut title = format!("Section {}", section.num);
            if section.num > record.last_section() {
                title.push_str(" (orphaned)");
            }
            if section.visible {
                println!("{}", title.cyan());
            } else {
                println!("{}", format!("{title} (hidden)").dimmed());
            }
        }
        for item in items.iter().filter(|i| section.items.contains(&i.id)) {
            println!(
                "{}",
                output::item_line(item, selectable.contains(&item.id), session.quiet)
            );
        }
    }
    Ok(())
}
