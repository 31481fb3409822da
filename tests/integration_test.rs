//! Integration tests for massact
//!
//! These tests drive the bulk executor against a real sled database in a
//! temporary directory, the same wiring the CLI uses.

use massact::auth::{Capability, StaticAuthorization};
use massact::bulk::{BulkError, BulkExecutor, BulkSettings, Services, TargetSection};
use massact::course::{CourseId, Item, ItemId, SectionNum};
use massact::db::Database;
use massact::events::BulkEvent;
use massact::hooks::HookRegistry;
use massact::tasks::TaskDescriptor;
use tempfile::TempDir;

struct Env {
    db: Database,
    hooks: HookRegistry,
    auth: StaticAuthorization,
    _dir: TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("db")).unwrap();
        Self {
            db,
            hooks: HookRegistry::new(),
            auth: StaticAuthorization::allow_all(),
            _dir: dir,
        }
    }

    fn exec(&self) -> BulkExecutor<'_> {
        let services = Services::from_store(&self.db, &self.auth, &self.hooks, &self.db);
        BulkExecutor::new(services, BulkSettings::default())
    }

    fn course(&self, last_section: SectionNum) -> CourseId {
        self.db.create_course("Course", last_section).unwrap().id
    }

    fn add(&self, course: CourseId, section: SectionNum, name: &str) -> ItemId {
        self.db.add_item(course, section, "page", name).unwrap().id
    }

    fn items(&self, ids: &[ItemId]) -> Vec<Item> {
        self.db.items_by_id(ids).unwrap()
    }

    fn section_ids(&self, course: CourseId, section: SectionNum) -> Vec<ItemId> {
        self.db
            .get_course(course)
            .unwrap()
            .unwrap()
            .section(section)
            .map(|s| s.items.clone())
            .unwrap_or_default()
    }
}

#[test]
fn test_duplicate_keeps_course_order() {
    let env = Env::new();
    let course = env.course(2);
    let a = env.add(course, 1, "A");
    let b = env.add(course, 1, "B");
    let c = env.add(course, 2, "C");

    // Selection order must not matter
    let outcome = env.exec().duplicate(&env.items(&[c, a, b]), None).unwrap();

    assert_eq!(outcome.succeeded_sources(), vec![a, b, c]);
    assert!(outcome.failed.is_empty());
    let copies = outcome.produced();
    assert_eq!(env.section_ids(course, 1), vec![a, b, copies[0], copies[1]]);
    assert_eq!(env.section_ids(course, 2), vec![c, copies[2]]);

    let copy = env.db.get_item(copies[0]).unwrap().unwrap();
    assert_eq!(copy.name, "A (copy)");
}

#[test]
fn test_duplicate_into_fixed_section() {
    let env = Env::new();
    let course = env.course(2);
    let a = env.add(course, 1, "A");
    let b = env.add(course, 2, "B");

    let outcome = env.exec().duplicate(&env.items(&[b, a]), Some(0)).unwrap();

    assert_eq!(env.section_ids(course, 0), outcome.produced());
    assert_eq!(env.section_ids(course, 1), vec![a]);
    assert_eq!(env.section_ids(course, 2), vec![b]);
}

#[test]
fn test_copy_to_course_creates_missing_sections() {
    let env = Env::new();
    let source = env.course(3);
    let target = env.course(1);
    let a = env.add(source, 1, "A");
    let b = env.add(source, 3, "B");

    let outcome = env
        .exec()
        .duplicate_to_course(&env.items(&[a, b]), target, TargetSection::PreserveSource)
        .unwrap();

    assert_eq!(outcome.succeeded.len(), 2);
    let record = env.db.get_course(target).unwrap().unwrap();
    assert_eq!(record.last_section(), 3);
    let copies = outcome.produced();
    assert_eq!(env.section_ids(target, 1), vec![copies[0]]);
    assert_eq!(env.section_ids(target, 3), vec![copies[1]]);
    // Source untouched
    assert_eq!(env.section_ids(source, 1), vec![a]);
}

#[test]
fn test_copy_to_course_without_update_capability() {
    let mut env = Env::new();
    env.auth = StaticAuthorization::with_denied([Capability::CourseUpdate]);
    let source = env.course(3);
    let target = env.course(1);
    let a = env.add(source, 3, "A");

    let err = env
        .exec()
        .duplicate_to_course(&env.items(&[a]), target, TargetSection::PreserveSource)
        .unwrap_err();

    assert!(matches!(err, BulkError::Capacity { .. }));
    assert_eq!(env.db.get_course(target).unwrap().unwrap().last_section(), 1);
    assert!(env.db.course_items(target).unwrap().is_empty());
}

#[test]
fn test_delete_logs_one_event() {
    let env = Env::new();
    let course = env.course(1);
    let a = env.add(course, 1, "A");
    let b = env.add(course, 1, "B");
    let keep = env.add(course, 1, "Keep");

    let outcome = env.exec().delete(&env.items(&[b, a])).unwrap();

    assert_eq!(outcome.succeeded_sources(), vec![a, b]);
    assert_eq!(env.section_ids(course, 1), vec![keep]);
    assert!(env.db.get_item(a).unwrap().is_none());

    let events = env.db.events(Some(course)).unwrap();
    assert_eq!(events.len(), 1);
    match &events[0].event {
        BulkEvent::ModulesDeleted { deleted, failed, .. } => {
            assert_eq!(deleted, &vec![a, b]);
            assert!(failed.is_empty());
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_move_and_indent() {
    let env = Env::new();
    let course = env.course(2);
    let a = env.add(course, 1, "A");
    let b = env.add(course, 2, "B");
    let existing = env.add(course, 0, "Intro");

    env.exec().move_to(&env.items(&[b, a]), 0).unwrap();
    assert_eq!(env.section_ids(course, 0), vec![existing, a, b]);

    let outcome = env.exec().adjust_indentation(&env.items(&[a]), 1).unwrap();
    assert_eq!(outcome.succeeded_sources(), vec![a]);
    assert_eq!(env.db.get_item(a).unwrap().unwrap().indent, 1);
}

#[test]
fn test_deferred_duplicate_runs_once() {
    let env = Env::new();
    let course = env.course(1);
    let a = env.add(course, 1, "A");
    let exec = env.exec();

    assert!(exec.queue_duplicate(&env.items(&[a]), None).unwrap());
    assert!(!exec.queue_duplicate(&env.items(&[a]), None).unwrap());

    let pending = env.db.pending_tasks().unwrap();
    assert_eq!(pending.len(), 1);
    let (id, task) = &pending[0];
    assert_eq!(
        task,
        &TaskDescriptor::Duplicate {
            course,
            items: vec![a],
            section: None,
        }
    );

    exec.run_task(task).unwrap();
    assert!(env.db.complete_task(*id).unwrap());
    assert!(env.db.pending_tasks().unwrap().is_empty());
    assert_eq!(env.section_ids(course, 1).len(), 2);

    let names: Vec<_> = env
        .db
        .events(None)
        .unwrap()
        .iter()
        .map(|e| e.event.name())
        .collect();
    assert_eq!(names, vec!["course_modules_duplicated"]);
}

#[test]
fn test_data_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db");
    let (course, item) = {
        let db = Database::open(&path).unwrap();
        let course = db.create_course("Persisted", 1).unwrap().id;
        let item = db.add_item(course, 1, "forum", "News").unwrap().id;
        db.flush().unwrap();
        (course, item)
    };

    let db = Database::open(&path).unwrap();
    let items = db.course_items(course).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, item);
    assert_eq!(items[0].kind, "forum");
}
