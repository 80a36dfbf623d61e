//! Task records, status rules, and id conventions.
//!
//! Ids are dot-delimited: the prefix before the last segment names the
//! parent, and an id with no dot is a root-level phase. The id is kept as a
//! display and sort key; traversal works over explicit parent links resolved
//! by the tree builder.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Task lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    NotStarted,
    InProgress,
    Completed,
    Pending,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::NotStarted,
        Status::InProgress,
        Status::Completed,
        Status::Pending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "not_started",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Pending => "pending",
        }
    }

    /// Parse a status cell from the remote sheet. Unrecognized values coerce
    /// to `NotStarted` so no row is ever dropped from the board.
    pub fn from_sheet(raw: &str) -> Status {
        raw.trim().parse().unwrap_or(Status::NotStarted)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::NotStarted => "Not started",
            Status::InProgress => "In progress",
            Status::Completed => "Completed",
            Status::Pending => "Pending",
        }
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "not_started" => Ok(Status::NotStarted),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            "pending" => Ok(Status::Pending),
            _ => Err(Error::InvalidArgument(format!(
                "invalid status '{s}': must be not_started, in_progress, completed, or pending"
            ))),
        }
    }
}

/// A single task record, the unit of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            status: Status::NotStarted,
            completed: false,
            start_date: None,
            due_date: None,
            assignee: None,
            category: None,
            progress: 0,
            parent_id: None,
        }
    }

    /// Directly select a status. `Completed` forces progress to 100; leaving
    /// it clears the completion flag but keeps the slider where it was.
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
        if status == Status::Completed {
            self.completed = true;
            self.progress = 100;
        } else {
            self.completed = false;
        }
    }

    /// Move the progress slider. Boundary values force the adjacent state:
    /// 0 is pending, 100 is completed, and partial progress pulls a pending
    /// or formerly-completed task back to in-progress.
    pub fn set_progress(&mut self, progress: u8) {
        let progress = progress.min(100);
        self.progress = progress;
        match progress {
            0 => {
                self.status = Status::Pending;
                self.completed = false;
            }
            100 => {
                self.status = Status::Completed;
                self.completed = true;
            }
            _ => {
                if matches!(self.status, Status::Pending | Status::Completed) {
                    self.status = Status::InProgress;
                }
                self.completed = false;
            }
        }
    }

    /// Flip the completion checkbox.
    pub fn toggle_completed(&mut self) {
        if self.completed || self.status == Status::Completed {
            self.status = Status::InProgress;
            self.completed = false;
            self.progress = 0;
        } else {
            self.status = Status::Completed;
            self.completed = true;
            self.progress = 100;
        }
    }

    /// A task is overdue when its due date has passed and it is not done.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => due < today && !self.completed && self.status != Status::Completed,
            None => false,
        }
    }

    /// The parent this task resolves to: the explicit assignment when
    /// present, otherwise the one encoded in the id.
    pub fn effective_parent(&self) -> Option<&str> {
        self.parent_id.as_deref().or_else(|| parent_of(&self.id))
    }
}

/// The id prefix before the last dot segment, if any.
pub fn parent_of(id: &str) -> Option<&str> {
    id.rfind('.').map(|idx| &id[..idx])
}

/// A phase is a top-level task whose id is a bare integer.
pub fn is_phase_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

/// Natural, numeric-aware ordering over dot-delimited ids: `1.2` sorts
/// before `1.10`, and `10` after `2`.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let cmp = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    _ => x.cmp(y),
                };
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
        }
    }
}

/// Sort a flat record list into display order.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| compare_ids(&a.id, &b.id));
}

/// Allocate the next child id under `parent` (`"2"` with children `2.1` and
/// `2.3` yields `2.4`; a childless parent yields `2.1`). Scanning for the
/// maximum index keeps deleted siblings from causing collisions.
pub fn next_child_id(parent: &str, tasks: &[Task]) -> String {
    let prefix = format!("{parent}.");
    let max = tasks
        .iter()
        .filter_map(|task| task.id.strip_prefix(prefix.as_str()))
        .filter(|rest| !rest.contains('.'))
        .filter_map(|rest| rest.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{parent}.{}", max + 1)
}

/// Allocate the next root id: one past the highest leading segment in use
/// anywhere, so a surviving `3.1` blocks a fresh root `3`.
pub fn next_root_id(tasks: &[Task]) -> String {
    let max = tasks
        .iter()
        .filter_map(|task| task.id.split('.').next())
        .filter_map(|segment| segment.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("{}", max + 1)
}

/// Reject empty or whitespace-only titles before any state is touched.
pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// A due date, when present, must not precede the start date.
pub fn validate_dates(start: Option<NaiveDate>, due: Option<NaiveDate>) -> Result<()> {
    if let (Some(start), Some(due)) = (start, due) {
        if due < start {
            return Err(Error::DateOrder { start, due });
        }
    }
    Ok(())
}
