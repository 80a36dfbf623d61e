//! Local task state and the mutation engine.
//!
//! The flat record list is the single owned store; the forest is a computed
//! view rebuilt after every mutation, so the two representations cannot
//! drift. Deletions land in a one-slot undo buffer holding at most the most
//! recently deleted record.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::board;
use crate::error::{Error, Result};
use crate::filter::{self, StatusFilter};
use crate::task::{self, Status, Task};
use crate::tree::{self, TreeNode};

/// Fields for a task about to be created.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub parent_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub category: Option<String>,
    pub status: Option<Status>,
}

/// Partial update applied by id; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub category: Option<String>,
    pub parent_id: Option<String>,
}

/// The one field a batch update may change across a selection.
#[derive(Debug, Clone)]
pub enum BatchChange {
    Status(Status),
    Assignee(String),
    Category(String),
}

#[derive(Default)]
struct Hooks {
    tasks_loaded: Option<Box<dyn Fn(&[Task])>>,
    progress_changed: Option<Box<dyn Fn(u8)>>,
}

/// In-memory task store with optimistic mutations and single-slot undo.
#[derive(Default)]
pub struct Engine {
    tasks: Vec<Task>,
    tree: Vec<TreeNode>,
    undo_slot: Option<Task>,
    last_progress: Option<u8>,
    hooks: Hooks,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invoked with the full flat list after every successful fetch.
    pub fn on_tasks_loaded(&mut self, hook: impl Fn(&[Task]) + 'static) {
        self.hooks.tasks_loaded = Some(Box::new(hook));
    }

    /// Invoked with the 0-100 leaf aggregate whenever it changes.
    pub fn on_progress_changed(&mut self, hook: impl Fn(u8) + 'static) {
        self.hooks.progress_changed = Some(Box::new(hook));
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn tree(&self) -> &[TreeNode] {
        &self.tree
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The dashboard-wide figure, always over the unfiltered forest.
    pub fn global_progress(&self) -> u8 {
        board::global_progress(&self.tree)
    }

    pub fn filtered(&self, filter: StatusFilter, today: NaiveDate) -> Vec<TreeNode> {
        filter::apply(&self.tree, filter, today)
    }

    pub fn kanban(&self, filter: StatusFilter, today: NaiveDate) -> BTreeMap<Status, Vec<Task>> {
        board::kanban_columns(&self.filtered(filter, today))
    }

    /// Wholesale replacement from a fetch or reconciliation poll.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
        self.rebuild();
        if let Some(hook) = &self.hooks.tasks_loaded {
            hook(&self.tasks);
        }
    }

    /// Create a task under the chosen parent, or at the root.
    pub fn create(&mut self, draft: NewTask, today: NaiveDate) -> Result<Task> {
        let title = task::validate_title(&draft.title)?;
        let start_date = Some(draft.start_date.unwrap_or(today));
        task::validate_dates(start_date, draft.due_date)?;

        let (id, parent_id) = match draft.parent_id {
            Some(parent) => {
                if self.find_task(&parent).is_none() {
                    return Err(Error::TaskNotFound(parent));
                }
                (task::next_child_id(&parent, &self.tasks), Some(parent))
            }
            None => (task::next_root_id(&self.tasks), None),
        };

        let mut created = Task {
            id,
            title,
            status: Status::NotStarted,
            completed: false,
            start_date,
            due_date: draft.due_date,
            assignee: draft.assignee,
            category: draft.category,
            progress: 0,
            parent_id,
        };
        if let Some(status) = draft.status {
            created.set_status(status);
        }

        self.tasks.push(created.clone());
        self.rebuild();
        Ok(created)
    }

    /// Patch a task's fields by id. Children are untouched; reassigning a
    /// parent rejects a task becoming its own ancestor.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        let idx = self.index_of(id)?;

        let title = match patch.title {
            Some(title) => Some(task::validate_title(&title)?),
            None => None,
        };

        if let Some(parent) = patch.parent_id.as_deref() {
            if self.find_task(parent).is_none() {
                return Err(Error::TaskNotFound(parent.to_string()));
            }
            if self.would_cycle(id, parent) {
                return Err(Error::CyclicParent(id.to_string()));
            }
        }

        let start = patch.start_date.or(self.tasks[idx].start_date);
        let due = patch.due_date.or(self.tasks[idx].due_date);
        task::validate_dates(start, due)?;

        let entry = &mut self.tasks[idx];
        if let Some(title) = title {
            entry.title = title;
        }
        if patch.start_date.is_some() {
            entry.start_date = patch.start_date;
        }
        if patch.due_date.is_some() {
            entry.due_date = patch.due_date;
        }
        if patch.assignee.is_some() {
            entry.assignee = patch.assignee;
        }
        if patch.category.is_some() {
            entry.category = patch.category;
        }
        if patch.parent_id.is_some() {
            entry.parent_id = patch.parent_id;
        }
        let snapshot = entry.clone();

        self.rebuild();
        Ok(snapshot)
    }

    pub fn set_status(&mut self, id: &str, status: Status) -> Result<Task> {
        self.mutate(id, |task| task.set_status(status))
    }

    pub fn set_progress(&mut self, id: &str, progress: u8) -> Result<Task> {
        self.mutate(id, |task| task.set_progress(progress))
    }

    pub fn toggle_completed(&mut self, id: &str) -> Result<Task> {
        self.mutate(id, Task::toggle_completed)
    }

    /// Remove a task and its entire subtree. The deleted record (not its
    /// subtree) lands in the undo buffer, overwriting any previous snapshot.
    pub fn delete(&mut self, id: &str) -> Result<Task> {
        let node = tree::find(&self.tree, id).ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let removed = node.task.clone();
        let doomed: HashSet<String> = tree::subtree_ids(node).into_iter().collect();

        self.tasks.retain(|task| !doomed.contains(&task.id));
        self.undo_slot = Some(removed.clone());
        self.rebuild();
        Ok(removed)
    }

    /// Restore the buffered deletion, if any. When the original parent is
    /// gone the builder's orphan rule surfaces the task at the top level.
    /// With an empty buffer this is a no-op.
    pub fn undo_delete(&mut self) -> Option<Task> {
        let restored = self.undo_slot.take()?;
        self.tasks.retain(|task| task.id != restored.id);
        self.tasks.push(restored.clone());
        self.rebuild();
        Some(restored)
    }

    pub fn has_undo(&self) -> bool {
        self.undo_slot.is_some()
    }

    /// Apply one field change to every selected task. Returns the ids that
    /// were actually touched, in list order.
    pub fn batch_update(&mut self, ids: &HashSet<String>, change: &BatchChange) -> Vec<String> {
        let mut changed = Vec::new();
        for task in &mut self.tasks {
            if !ids.contains(&task.id) {
                continue;
            }
            match change {
                BatchChange::Status(status) => task.set_status(*status),
                BatchChange::Assignee(assignee) => task.assignee = Some(assignee.clone()),
                BatchChange::Category(category) => task.category = Some(category.clone()),
            }
            changed.push(task.id.clone());
        }

        if !changed.is_empty() {
            self.rebuild();
        }
        changed
    }

    fn mutate(&mut self, id: &str, apply: impl FnOnce(&mut Task)) -> Result<Task> {
        let idx = self.index_of(id)?;
        apply(&mut self.tasks[idx]);
        let snapshot = self.tasks[idx].clone();
        self.rebuild();
        Ok(snapshot)
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    fn would_cycle(&self, id: &str, new_parent: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = Some(new_parent.to_string());
        while let Some(ancestor) = current {
            if ancestor == id {
                return true;
            }
            if !seen.insert(ancestor.clone()) {
                return false;
            }
            current = self
                .find_task(&ancestor)
                .and_then(|task| task.effective_parent().map(str::to_string));
        }
        false
    }

    fn rebuild(&mut self) {
        task::sort_tasks(&mut self.tasks);
        self.tree = tree::build(&self.tasks);
        let progress = board::global_progress(&self.tree);
        if self.last_progress != Some(progress) {
            self.last_progress = Some(progress);
            if let Some(hook) = &self.hooks.progress_changed {
                hook(progress);
            }
        }
    }
}
