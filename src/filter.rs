//! Status predicates over the task forest.
//!
//! A filtered view keeps a node when the node itself matches or any
//! descendant matches, and retained nodes keep only their retained children.
//! Overdue tasks surface under the pending view without their stored status
//! ever being rewritten.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::task::{Status, Task};
use crate::tree::TreeNode;

/// The status filter contract consumed from the surrounding dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    InProgress,
    Pending,
}

impl StatusFilter {
    /// Parse the external filter value. Absent and `"all"` are equivalent to
    /// no filtering; anything else unknown is a user error.
    pub fn parse(raw: Option<&str>) -> Result<StatusFilter> {
        match raw.map(str::trim) {
            None | Some("") | Some("all") => Ok(StatusFilter::All),
            Some("completed") => Ok(StatusFilter::Completed),
            Some("in_progress") => Ok(StatusFilter::InProgress),
            Some("pending") => Ok(StatusFilter::Pending),
            Some(other) => Err(Error::InvalidArgument(format!(
                "invalid filter '{other}': must be all, completed, in_progress, or pending"
            ))),
        }
    }

    fn matches(self, task: &Task, today: NaiveDate) -> bool {
        match self {
            StatusFilter::All => true,
            // Legacy rows may carry the completed flag without the status.
            StatusFilter::Completed => task.status == Status::Completed || task.completed,
            StatusFilter::InProgress => task.status == Status::InProgress,
            StatusFilter::Pending => task.status == Status::Pending || task.is_overdue(today),
        }
    }
}

/// Apply a status filter to the forest, preserving ancestors of matches.
pub fn apply(nodes: &[TreeNode], filter: StatusFilter, today: NaiveDate) -> Vec<TreeNode> {
    if filter == StatusFilter::All {
        return nodes.to_vec();
    }

    nodes
        .iter()
        .filter_map(|node| retain(node, filter, today))
        .collect()
}

fn retain(node: &TreeNode, filter: StatusFilter, today: NaiveDate) -> Option<TreeNode> {
    let children: Vec<TreeNode> = node
        .children
        .iter()
        .filter_map(|child| retain(child, filter, today))
        .collect();

    if filter.matches(&node.task, today) || !children.is_empty() {
        Some(TreeNode {
            task: node.task.clone(),
            is_phase: node.is_phase,
            children,
        })
    } else {
        None
    }
}
