// tests/task_registry.rs

mod common;

use std::error::Error;

use sitepipe::errors::SitepipeError;
use sitepipe::task::{TaskKind, TaskRegistry};

use crate::common::{EventLog, FakeAction};

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn registering_two_leaves_named_images_fails() -> TestResult {
    let log = EventLog::new();
    let mut registry = TaskRegistry::new();

    registry.register("images", FakeAction::new("images", &log).arc())?;
    let err = registry
        .register("images", FakeAction::new("images", &log).arc())
        .unwrap_err();

    assert!(matches!(err, SitepipeError::DuplicateName(ref name) if name == "images"));
    assert_eq!(registry.len(), 1);
    Ok(())
}

#[test]
fn lookup_of_unknown_name_fails() {
    let registry = TaskRegistry::new();
    let err = registry.get("nope").unwrap_err();
    assert!(matches!(err, SitepipeError::UnknownTask(ref name) if name == "nope"));
}

#[test]
fn registration_does_not_execute_anything() -> TestResult {
    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    let a = registry.register("a", FakeAction::new("a", &log).arc())?;
    let b = registry.register("b", FakeAction::new("b", &log).arc())?;
    registry.series(&[a, b])?;

    assert!(log.entries().is_empty());
    Ok(())
}

#[test]
fn named_composites_share_the_name_index() -> TestResult {
    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    let a = registry.register("a", FakeAction::new("a", &log).arc())?;
    let b = registry.register("b", FakeAction::new("b", &log).arc())?;
    let both = registry.parallel(&[a, b])?;

    registry.name_task("both", both)?;
    assert_eq!(registry.get("both")?, both);
    assert_eq!(registry.task(both)?.kind(), TaskKind::Parallel);
    assert_eq!(registry.task(both)?.children(), &[a, b]);

    let err = registry.name_task("a", both).unwrap_err();
    assert!(matches!(err, SitepipeError::DuplicateName(_)));

    assert_eq!(registry.names(), vec!["a", "b", "both"]);
    Ok(())
}

#[test]
fn leaf_message_is_kept_on_the_task() -> TestResult {
    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    let id = registry.register_with_message(
        "mainAssets",
        FakeAction::new("mainAssets", &log).arc(),
        Some("Building JS files...".to_string()),
    )?;

    let task = registry.task(id)?;
    assert_eq!(task.kind(), TaskKind::Leaf);
    assert_eq!(task.message(), Some("Building JS files..."));
    assert!(task.children().is_empty());
    Ok(())
}

#[test]
fn describe_renders_the_composition_tree() -> TestResult {
    let log = EventLog::new();
    let mut registry = TaskRegistry::new();
    let a = registry.register("a", FakeAction::new("a", &log).arc())?;
    let b = registry.register("b", FakeAction::new("b", &log).arc())?;
    let c = registry.register("c", FakeAction::new("c", &log).arc())?;
    let ab = registry.parallel(&[a, b])?;
    let all = registry.series(&[ab, c])?;
    registry.name_task("all", all)?;

    let expected = "- all [series]\n  - [parallel]\n    - a\n    - b\n  - c\n";
    assert_eq!(registry.describe(all), expected);
    Ok(())
}
