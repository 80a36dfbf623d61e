use std::collections::HashSet;

use trellis::engine::{BatchChange, Engine, NewTask, TaskPatch};
use trellis::error::Error;
use trellis::task::Status;
use trellis::tree::flatten;

mod support;

fn seeded_engine() -> Engine {
    let mut engine = Engine::new();
    engine.replace_all(vec![
        support::task("1", "Phase one"),
        support::task("1.1", "Collect requirements"),
        support::task("1.2", "Draft protocol"),
        support::task("2", "Phase two"),
        support::task("2.1", "Prepare equipment"),
    ]);
    engine
}

fn draft(title: &str, parent: Option<&str>) -> NewTask {
    NewTask {
        title: title.to_string(),
        parent_id: parent.map(str::to_string),
        ..NewTask::default()
    }
}

#[test]
fn create_requires_a_title() {
    let mut engine = seeded_engine();
    let err = engine
        .create(draft("   ", None), support::date(2026, 8, 6))
        .unwrap_err();
    assert!(matches!(err, Error::EmptyTitle));
    assert_eq!(engine.tasks().len(), 5);
}

#[test]
fn create_allocates_child_and_root_ids() {
    let mut engine = seeded_engine();
    let today = support::date(2026, 8, 6);

    let child = engine.create(draft("Review draft", Some("1")), today).unwrap();
    assert_eq!(child.id, "1.3");
    assert_eq!(child.parent_id.as_deref(), Some("1"));
    assert_eq!(child.start_date, Some(today));

    let root = engine.create(draft("Phase three", None), today).unwrap();
    assert_eq!(root.id, "3");
}

#[test]
fn create_under_unknown_parent_is_rejected() {
    let mut engine = seeded_engine();
    let err = engine
        .create(draft("x", Some("9")), support::date(2026, 8, 6))
        .unwrap_err();
    assert!(matches!(err, Error::TaskNotFound(_)));
}

#[test]
fn flat_list_and_tree_stay_in_lockstep() {
    let mut engine = seeded_engine();
    let today = support::date(2026, 8, 6);
    engine.create(draft("New leaf", Some("2")), today).unwrap();
    engine.delete("1.2").unwrap();

    let tree_ids: Vec<&str> = flatten(engine.tree())
        .iter()
        .map(|task| task.id.as_str())
        .collect();
    let flat_ids: Vec<&str> = engine.tasks().iter().map(|task| task.id.as_str()).collect();
    assert_eq!(tree_ids, flat_ids);
}

#[test]
fn update_patches_fields_and_keeps_children() {
    let mut engine = seeded_engine();
    let patch = TaskPatch {
        title: Some("Phase one (renamed)".to_string()),
        assignee: Some("ana".to_string()),
        ..TaskPatch::default()
    };
    engine.update("1", patch).unwrap();

    let node = trellis::tree::find(engine.tree(), "1").unwrap();
    assert_eq!(node.task.title, "Phase one (renamed)");
    assert_eq!(node.children.len(), 2);
}

#[test]
fn reparenting_onto_a_descendant_is_rejected() {
    let mut engine = seeded_engine();
    let patch = TaskPatch {
        parent_id: Some("1.1".to_string()),
        ..TaskPatch::default()
    };
    let err = engine.update("1", patch).unwrap_err();
    assert!(matches!(err, Error::CyclicParent(_)));
}

#[test]
fn due_date_must_not_precede_start_date() {
    let mut engine = seeded_engine();
    engine
        .update(
            "1.1",
            TaskPatch {
                start_date: Some(support::date(2026, 8, 10)),
                ..TaskPatch::default()
            },
        )
        .unwrap();

    let err = engine
        .update(
            "1.1",
            TaskPatch {
                due_date: Some(support::date(2026, 8, 1)),
                ..TaskPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::DateOrder { .. }));
}

#[test]
fn delete_removes_the_subtree_and_undo_restores_the_record() {
    let mut engine = seeded_engine();
    let before = engine.find_task("1").unwrap().clone();

    let removed = engine.delete("1").unwrap();
    assert_eq!(removed, before);
    assert!(engine.find_task("1").is_none());
    assert!(engine.find_task("1.1").is_none());
    assert!(engine.find_task("1.2").is_none());

    let restored = engine.undo_delete().unwrap();
    assert_eq!(restored, before);
    let node = trellis::tree::find(engine.tree(), "1").unwrap();
    assert!(node.is_phase);
    // The subtree is gone for good; only the buffered record returns.
    assert!(engine.find_task("1.1").is_none());
}

#[test]
fn second_undo_is_a_no_op() {
    let mut engine = seeded_engine();
    engine.delete("2.1").unwrap();
    assert!(engine.undo_delete().is_some());
    assert!(engine.undo_delete().is_none());
    assert_eq!(engine.tasks().len(), 5);
}

#[test]
fn undo_buffer_holds_only_the_last_deletion() {
    let mut engine = seeded_engine();
    engine.delete("1.1").unwrap();
    engine.delete("1.2").unwrap();

    let restored = engine.undo_delete().unwrap();
    assert_eq!(restored.id, "1.2");
    assert!(engine.find_task("1.1").is_none());
}

#[test]
fn undo_after_parent_vanishes_surfaces_at_top_level() {
    let mut engine = seeded_engine();
    engine.delete("2.1").unwrap();

    // A reconciliation poll removes the parent phase remotely.
    engine.replace_all(vec![support::task("1", "Phase one")]);

    let restored = engine.undo_delete().unwrap();
    assert_eq!(restored.id, "2.1");
    let roots: Vec<&str> = engine.tree().iter().map(|node| node.task.id.as_str()).collect();
    assert_eq!(roots, ["1", "2.1"]);
}

#[test]
fn batch_completed_forces_progress_on_selected_tasks_only() {
    let mut engine = seeded_engine();
    let ids: HashSet<String> = ["1.1", "2.1"].iter().map(|id| id.to_string()).collect();

    let changed = engine.batch_update(&ids, &BatchChange::Status(Status::Completed));
    assert_eq!(changed.len(), 2);

    for id in ["1.1", "2.1"] {
        let task = engine.find_task(id).unwrap();
        assert_eq!(task.status, Status::Completed);
        assert_eq!(task.progress, 100);
        assert!(task.completed);
    }
    let untouched = engine.find_task("1.2").unwrap();
    assert_eq!(untouched.status, Status::NotStarted);
    assert_eq!(untouched.progress, 0);
}

#[test]
fn batch_assignee_applies_one_field() {
    let mut engine = seeded_engine();
    let ids: HashSet<String> = ["1.1"].iter().map(|id| id.to_string()).collect();

    engine.batch_update(&ids, &BatchChange::Assignee("li".to_string()));
    assert_eq!(engine.find_task("1.1").unwrap().assignee.as_deref(), Some("li"));
    assert_eq!(engine.find_task("1.2").unwrap().assignee, None);
}

#[test]
fn progress_hook_fires_when_the_leaf_aggregate_moves() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let seen: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);

    let mut engine = Engine::new();
    engine.on_progress_changed(move |progress| sink.borrow_mut().push(progress));
    engine.replace_all(vec![support::task("1", "only leaf")]);
    engine.set_progress("1", 40).unwrap();
    // No aggregate movement, no callback.
    engine.update("1", TaskPatch { title: Some("renamed".into()), ..TaskPatch::default() }).unwrap();
    engine.set_progress("1", 100).unwrap();

    assert_eq!(*seen.borrow(), vec![0, 40, 100]);
}

#[test]
fn tasks_loaded_hook_fires_on_replace() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let counts: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&counts);

    let mut engine = Engine::new();
    engine.on_tasks_loaded(move |tasks| sink.borrow_mut().push(tasks.len()));
    engine.replace_all(vec![support::task("1", "a"), support::task("2", "b")]);
    engine.create(draft("c", None), support::date(2026, 8, 6)).unwrap();

    // Only fetch-style replacement reports the loaded list.
    assert_eq!(*counts.borrow(), vec![2]);
}
