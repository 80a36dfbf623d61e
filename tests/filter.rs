use trellis::filter::{apply, StatusFilter};
use trellis::task::Status;
use trellis::tree::{build, flatten};

mod support;

#[test]
fn parse_accepts_the_dashboard_contract() {
    assert_eq!(StatusFilter::parse(None).unwrap(), StatusFilter::All);
    assert_eq!(StatusFilter::parse(Some("all")).unwrap(), StatusFilter::All);
    assert_eq!(
        StatusFilter::parse(Some("completed")).unwrap(),
        StatusFilter::Completed
    );
    assert_eq!(
        StatusFilter::parse(Some("in_progress")).unwrap(),
        StatusFilter::InProgress
    );
    assert_eq!(
        StatusFilter::parse(Some("pending")).unwrap(),
        StatusFilter::Pending
    );
    assert!(StatusFilter::parse(Some("archived")).is_err());
}

#[test]
fn all_filter_is_the_identity() {
    let records = vec![support::task("1", "a"), support::task("1.1", "b")];
    let forest = build(&records);
    let view = apply(&forest, StatusFilter::All, support::date(2026, 8, 6));
    assert_eq!(view, forest);
}

#[test]
fn ancestor_of_a_match_is_retained() {
    // The phase itself is not_started; only its grandchild is completed.
    let records = vec![
        support::task("1", "phase"),
        support::task("1.1", "group"),
        support::task_with_status("1.1.1", Status::Completed),
        support::task_with_status("2", Status::InProgress),
    ];

    let forest = build(&records);
    let view = apply(&forest, StatusFilter::Completed, support::date(2026, 8, 6));

    let ids: Vec<&str> = flatten(&view).iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids, ["1", "1.1", "1.1.1"]);
}

#[test]
fn retained_nodes_keep_only_matching_children() {
    let records = vec![
        support::task_with_status("1", Status::Completed),
        support::task_with_status("1.1", Status::Completed),
        support::task_with_status("1.2", Status::InProgress),
    ];

    let forest = build(&records);
    let view = apply(&forest, StatusFilter::Completed, support::date(2026, 8, 6));

    assert_eq!(view.len(), 1);
    let children: Vec<&str> = view[0]
        .children
        .iter()
        .map(|node| node.task.id.as_str())
        .collect();
    assert_eq!(children, ["1.1"]);
}

#[test]
fn legacy_completed_flag_matches_without_the_status() {
    let mut legacy = support::task("1", "old row");
    legacy.completed = true;

    let forest = build(&[legacy]);
    let view = apply(&forest, StatusFilter::Completed, support::date(2026, 8, 6));
    assert_eq!(view.len(), 1);
}

#[test]
fn overdue_tasks_surface_under_pending_without_status_rewrite() {
    let today = support::date(2026, 8, 6);
    let mut overdue = support::task_with_status("1", Status::InProgress);
    overdue.due_date = Some(support::date(2026, 7, 1));
    let mut on_track = support::task_with_status("2", Status::InProgress);
    on_track.due_date = Some(support::date(2026, 9, 1));

    let forest = build(&[overdue, on_track]);
    let view = apply(&forest, StatusFilter::Pending, today);

    assert_eq!(view.len(), 1);
    assert_eq!(view[0].task.id, "1");
    // The stored status is untouched; only the view reclassifies.
    assert_eq!(view[0].task.status, Status::InProgress);
}

#[test]
fn completed_tasks_never_count_as_overdue() {
    let today = support::date(2026, 8, 6);
    let mut done = support::task_with_status("1", Status::Completed);
    done.due_date = Some(support::date(2026, 7, 1));

    let forest = build(&[done]);
    let view = apply(&forest, StatusFilter::Pending, today);
    assert!(view.is_empty());
}
