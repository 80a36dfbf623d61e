use trellis::task::Task;
use trellis::tree::{build, flatten};

mod support;

#[test]
fn flatten_after_build_is_a_permutation_of_input_ids() {
    let records = vec![
        support::task("2.1", "b"),
        support::task("1", "a"),
        support::task("2", "c"),
        support::task("1.2.1", "deep"),
        support::task("1.2", "d"),
        support::task("3.9", "orphan child"),
    ];

    let forest = build(&records);
    let mut ids: Vec<&str> = flatten(&forest).iter().map(|task| task.id.as_str()).collect();
    ids.sort_unstable();

    let mut expected: Vec<&str> = records.iter().map(|task| task.id.as_str()).collect();
    expected.sort_unstable();
    assert_eq!(ids, expected);
}

#[test]
fn phase_flag_follows_the_id_shape() {
    let records = vec![support::task("4", "phase"), support::task("4.2", "leaf")];
    let forest = build(&records);

    assert!(forest[0].is_phase);
    assert!(!forest[0].children[0].is_phase);
}

#[test]
fn roots_sort_numerically_not_lexically() {
    let records = vec![
        support::task("2", "two"),
        support::task("1", "one"),
        support::task("10", "ten"),
    ];

    let forest = build(&records);
    let order: Vec<&str> = forest.iter().map(|node| node.task.id.as_str()).collect();
    assert_eq!(order, ["1", "2", "10"]);
}

#[test]
fn children_sort_naturally_within_a_parent() {
    let records = vec![
        support::task("1", "phase"),
        support::task("1.10", "late"),
        support::task("1.2", "early"),
        support::task("1.1", "first"),
    ];

    let forest = build(&records);
    let order: Vec<&str> = forest[0]
        .children
        .iter()
        .map(|node| node.task.id.as_str())
        .collect();
    assert_eq!(order, ["1.1", "1.2", "1.10"]);
}

#[test]
fn orphaned_parent_reference_degrades_to_root() {
    let records = vec![support::task("1", "phase"), support::task("7.3", "lost")];
    let forest = build(&records);

    let roots: Vec<&str> = forest.iter().map(|node| node.task.id.as_str()).collect();
    assert_eq!(roots, ["1", "7.3"]);
}

#[test]
fn duplicate_ids_resolve_last_write_wins() {
    let records = vec![
        support::task("1", "stale title"),
        support::task("1", "fresh title"),
    ];

    let forest = build(&records);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].task.title, "fresh title");
}

#[test]
fn explicit_parent_id_overrides_the_id_prefix() {
    let mut adopted = Task::new("9", "adopted");
    adopted.parent_id = Some("1".to_string());
    let records = vec![support::task("1", "phase"), adopted];

    let forest = build(&records);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].children[0].task.id, "9");
}
