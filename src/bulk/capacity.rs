//! Section capacity of a target course
//!
//! Duplicating into a course can require sections it does not have yet.
//! Sections beyond the format's declared count but physically present
//! (orphans) are made visible again before anything new is created.

use tracing::{debug, info};

use super::error::{BulkError, BulkResult};
use crate::course::{CourseId, CourseRepository, FormatOptions, SectionNum};

/// Creates sections on demand, bounded by permission and a ceiling
pub struct SectionCapacity<'a> {
    repo: &'a dyn CourseRepository,
    max_sections: SectionNum,
}

impl<'a> SectionCapacity<'a> {
    #[must_use]
    pub fn new(repo: &'a dyn CourseRepository, max_sections: SectionNum) -> Self {
        Self { repo, max_sections }
    }

    fn refuse(&self, course: CourseId, requested: SectionNum, can_create: bool) -> Option<BulkError> {
        if !can_create {
            return Some(BulkError::Capacity {
                course,
                requested,
                reason: "adding sections is not permitted".into(),
            });
        }
        if requested > self.max_sections {
            return Some(BulkError::Capacity {
                course,
                requested,
                reason: format!("courses are limited to {} sections", self.max_sections),
            });
        }
        None
    }

    /// Make sure `requested` names a usable section and return its number.
    ///
    /// A number beyond the last section yields exactly one extra section,
    /// appended right after the current last one; the returned number is
    /// that section's.
    ///
    /// # Errors
    /// Returns `BulkError::Capacity` if a section is needed but `can_create`
    /// is false or the ceiling would be exceeded.
    pub fn ensure_section(
        &self,
        course: CourseId,
        requested: SectionNum,
        can_create: bool,
    ) -> BulkResult<SectionNum> {
        let record = self.repo.course(course)?;
        let last = record.last_section();
        if requested <= last {
            return Ok(requested);
        }
        let next = last + 1;
        if let Some(err) = self.refuse(course, next, can_create) {
            return Err(err);
        }

        let physical_last = record.physical_last_section();
        match record.format.num_sections {
            Some(declared) => {
                if declared >= physical_last {
                    self.repo.create_section(course)?;
                } else {
                    debug!(course, declared, physical_last, "reusing orphaned section");
                }
                self.repo.update_format_options(
                    course,
                    &FormatOptions {
                        num_sections: Some(declared + 1),
                    },
                )?;
            }
            None => {
                self.repo.create_section(course)?;
            }
        }
        info!(course, section = next, "section made available");
        Ok(next)
    }

    /// Make sure sections `0..=max_index` exist and are visible through the format.
    ///
    /// # Errors
    /// Returns `BulkError::Capacity` if sections are needed but `can_create`
    /// is false or the ceiling would be exceeded.
    pub fn ensure_capacity_up_to(
        &self,
        course: CourseId,
        max_index: SectionNum,
        can_create: bool,
    ) -> BulkResult<()> {
        let record = self.repo.course(course)?;
        if max_index <= record.last_section() {
            return Ok(());
        }
        if let Some(err) = self.refuse(course, max_index, can_create) {
            return Err(err);
        }

        let mut physical_last = record.physical_last_section();
        let mut created = 0_u32;
        while physical_last < max_index {
            let num = self.repo.create_section(course)?;
            if num <= physical_last {
                return Err(BulkError::Store(format!(
                    "section creation in course {course} did not advance past {physical_last}"
                )));
            }
            physical_last = num;
            created += 1;
        }

        if let Some(declared) = record.format.num_sections
            && declared < max_index
        {
            self.repo.update_format_options(
                course,
                &FormatOptions {
                    num_sections: Some(max_index),
                },
            )?;
        }
        info!(course, max_index, created, "section capacity ensured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryCourses;

    #[test]
    fn test_existing_section_is_returned_unchanged() {
        let store = MemoryCourses::new();
        store.add_course(1, 3);
        let capacity = SectionCapacity::new(&store, 52);
        assert_eq!(capacity.ensure_section(1, 2, false).unwrap(), 2);
        assert_eq!(store.course_record(1).sections.len(), 4);
    }

    #[test]
    fn test_creates_exactly_one_section() {
        let store = MemoryCourses::new();
        store.add_course(1, 2);
        let capacity = SectionCapacity::new(&store, 52);
        assert_eq!(capacity.ensure_section(1, 9, true).unwrap(), 3);
        assert_eq!(store.course_record(1).section_numbers(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_refuses_without_permission() {
        let store = MemoryCourses::new();
        store.add_course(1, 2);
        let capacity = SectionCapacity::new(&store, 52);
        let err = capacity.ensure_section(1, 3, false).unwrap_err();
        assert!(matches!(err, BulkError::Capacity { requested: 3, .. }));
        assert_eq!(store.course_record(1).sections.len(), 3);
    }

    #[test]
    fn test_ceiling_is_enforced() {
        let store = MemoryCourses::new();
        store.add_course(1, 4);
        let capacity = SectionCapacity::new(&store, 4);
        assert!(matches!(
            capacity.ensure_section(1, 5, true),
            Err(BulkError::Capacity { .. })
        ));
        assert!(matches!(
            capacity.ensure_capacity_up_to(1, 6, true),
            Err(BulkError::Capacity { .. })
        ));
    }

    #[test]
    fn test_orphaned_section_is_reused() {
        let store = MemoryCourses::new();
        store.add_course(1, 5);
        store.set_num_sections(1, Some(3));
        let capacity = SectionCapacity::new(&store, 52);

        assert_eq!(capacity.ensure_section(1, 7, true).unwrap(), 4);
        let course = store.course_record(1);
        assert_eq!(course.physical_last_section(), 5);
        assert_eq!(course.format.num_sections, Some(4));
    }

    #[test]
    fn test_declared_count_grows_with_new_section() {
        let store = MemoryCourses::new();
        store.add_course(1, 2);
        store.set_num_sections(1, Some(2));
        let capacity = SectionCapacity::new(&store, 52);

        assert_eq!(capacity.ensure_section(1, 3, true).unwrap(), 3);
        let course = store.course_record(1);
        assert_eq!(course.physical_last_section(), 3);
        assert_eq!(course.format.num_sections, Some(3));
    }

    #[test]
    fn test_capacity_up_to_creates_missing_sections() {
        let store = MemoryCourses::new();
        store.add_course(1, 1);
        let capacity = SectionCapacity::new(&store, 52);

        capacity.ensure_capacity_up_to(1, 4, true).unwrap();
        assert_eq!(store.course_record(1).section_numbers(), vec![0, 1, 2, 3, 4]);

        // Already satisfied, even without permission
        capacity.ensure_capacity_up_to(1, 4, false).unwrap();
    }

    #[test]
    fn test_capacity_up_to_uncovers_orphans_before_creating() {
        let store = MemoryCourses::new();
        store.add_course(1, 4);
        store.set_num_sections(1, Some(2));
        let capacity = SectionCapacity::new(&store, 52);

        capacity.ensure_capacity_up_to(1, 5, true).unwrap();
        let course = store.course_record(1);
        assert_eq!(course.physical_last_section(), 5);
        assert_eq!(course.format.num_sections, Some(5));
        assert_eq!(course.last_section(), 5);
    }

    #[test]
    fn test_capacity_up_to_refuses_without_permission() {
        let store = MemoryCourses::new();
        store.add_course(1, 1);
        let capacity = SectionCapacity::new(&store, 52);
        assert!(capacity.ensure_capacity_up_to(1, 3, false).is_err());
        assert_eq!(store.course_record(1).physical_last_section(), 1);
    }
}
