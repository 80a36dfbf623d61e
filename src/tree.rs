//! Task tree construction.
//!
//! Converts the flat record list into a rooted forest. Parent references are
//! resolved within the record set; anything that does not resolve (orphaned
//! parents, cycles) degrades to root placement rather than failing, so
//! flattening the forest always yields a permutation of the input ids.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::task::{compare_ids, is_phase_id, Task};

/// A task plus its ordered children. `is_phase` marks top-level tasks whose
/// id is a bare integer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub task: Task,
    pub is_phase: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Build the forest from a flat record list.
///
/// Duplicate ids resolve last-write-wins. Roots are ordered by the numeric
/// value of their leading segment; every child list is ordered by natural
/// comparison of the full id, so `1.2` precedes `1.10`.
pub fn build(records: &[Task]) -> Vec<TreeNode> {
    let mut order: Vec<&str> = Vec::new();
    let mut latest: HashMap<&str, &Task> = HashMap::new();
    for task in records {
        if latest.insert(task.id.as_str(), task).is_none() {
            order.push(task.id.as_str());
        }
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut roots: Vec<&str> = Vec::new();
    for id in &order {
        let task = latest[*id];
        match task.effective_parent() {
            Some(parent) if parent != *id && latest.contains_key(parent) => {
                children.entry(parent).or_default().push(*id);
            }
            _ => roots.push(*id),
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut forest: Vec<TreeNode> = Vec::new();
    for id in &roots {
        forest.push(make_node(id, &latest, &children, &mut visited));
    }

    // Mutually-parented records are unreachable from any root; surface them
    // as roots instead of dropping them.
    for id in &order {
        if !visited.contains(id) {
            forest.push(make_node(id, &latest, &children, &mut visited));
        }
    }

    forest.sort_by(|a, b| compare_ids(&a.task.id, &b.task.id));
    forest
}

fn make_node<'a>(
    id: &'a str,
    latest: &HashMap<&'a str, &'a Task>,
    children: &HashMap<&'a str, Vec<&'a str>>,
    visited: &mut HashSet<&'a str>,
) -> TreeNode {
    visited.insert(id);
    let mut child_nodes = Vec::new();
    if let Some(ids) = children.get(id) {
        for child in ids {
            if !visited.contains(child) {
                child_nodes.push(make_node(child, latest, children, visited));
            }
        }
    }
    child_nodes.sort_by(|a, b| compare_ids(&a.task.id, &b.task.id));

    TreeNode {
        task: latest[id].clone(),
        is_phase: is_phase_id(id),
        children: child_nodes,
    }
}

/// Pre-order traversal over the forest.
pub fn flatten(nodes: &[TreeNode]) -> Vec<&Task> {
    fn walk<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a Task>) {
        for node in nodes {
            out.push(&node.task);
            walk(&node.children, out);
        }
    }

    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}

/// Locate a node by id anywhere in the forest.
pub fn find<'a>(nodes: &'a [TreeNode], id: &str) -> Option<&'a TreeNode> {
    for node in nodes {
        if node.task.id == id {
            return Some(node);
        }
        if let Some(found) = find(&node.children, id) {
            return Some(found);
        }
    }
    None
}

/// All ids in a node's subtree, the node itself first.
pub fn subtree_ids(node: &TreeNode) -> Vec<String> {
    let mut ids = vec![node.task.id.clone()];
    for child in &node.children {
        ids.extend(subtree_ids(child));
    }
    ids
}
