//! Aggregates over the task forest: global progress and kanban bucketing.

use std::collections::BTreeMap;

use crate::task::{Status, Task};
use crate::tree::{flatten, TreeNode};

/// Average progress over leaf tasks only, rounded to nearest. Phase and
/// parent progress values are cosmetic and excluded. An empty leaf set is 0,
/// never an error.
///
/// The dashboard-wide figure is computed over the unfiltered forest.
pub fn global_progress(nodes: &[TreeNode]) -> u8 {
    let mut leaves = Vec::new();
    collect_leaves(nodes, &mut leaves);
    if leaves.is_empty() {
        return 0;
    }

    let total: u64 = leaves.iter().map(|task| u64::from(task.progress)).sum();
    ((total as f64 / leaves.len() as f64).round()) as u8
}

fn collect_leaves<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a Task>) {
    for node in nodes {
        if node.is_leaf() {
            out.push(&node.task);
        } else {
            collect_leaves(&node.children, out);
        }
    }
}

/// Partition the (possibly filtered) forest into status-keyed columns in
/// pre-order. Every column is present even when empty. Unrecognized status
/// strings were already coerced to `not_started` at the sheet boundary, so
/// no task can be missing from the board.
pub fn kanban_columns(nodes: &[TreeNode]) -> BTreeMap<Status, Vec<Task>> {
    let mut columns: BTreeMap<Status, Vec<Task>> = BTreeMap::new();
    for status in Status::ALL {
        columns.insert(status, Vec::new());
    }

    for task in flatten(nodes) {
        columns
            .entry(task.status)
            .or_default()
            .push(task.clone());
    }
    columns
}

/// Dashboard statistics computed over the flat record list, for consumers
/// outside the tree core (deadline widgets, headline counters).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub remaining: usize,
    pub overdue: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_deadline: Option<chrono::NaiveDate>,
}

pub fn stats(tasks: &[Task], today: chrono::NaiveDate) -> Stats {
    let completed = tasks.iter().filter(|task| task.completed).count();
    let overdue = tasks.iter().filter(|task| task.is_overdue(today)).count();
    let next_deadline = tasks
        .iter()
        .filter(|task| !task.completed)
        .filter_map(|task| task.due_date)
        .filter(|due| *due >= today)
        .min();

    Stats {
        total: tasks.len(),
        completed,
        remaining: tasks.len() - completed,
        overdue,
        next_deadline,
    }
}
