//! trellis task command implementations.

use std::collections::HashSet;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::cli::{open_session, Context};
use crate::engine::{BatchChange, NewTask, TaskPatch};
use crate::error::{Error, Result};
use crate::events::EventKind;
use crate::filter::StatusFilter;
use crate::output::{emit_success, HumanOutput};
use crate::task::{Status, Task};
use crate::tree::TreeNode;

pub struct AddOptions {
    pub title: String,
    pub parent: Option<String>,
    pub start: Option<String>,
    pub due: Option<String>,
    pub assignee: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub start: Option<String>,
    pub due: Option<String>,
    pub assignee: Option<String>,
    pub category: Option<String>,
    pub parent: Option<String>,
}

pub struct BatchOptions {
    pub ids: Vec<String>,
    pub status: Option<String>,
    pub assignee: Option<String>,
    pub category: Option<String>,
}

#[derive(Serialize)]
struct MutationOutput<'a> {
    task: &'a Task,
    synced: bool,
}

#[derive(Serialize)]
struct BatchOutput<'a> {
    changed: &'a [String],
    synced: bool,
}

pub async fn run_list(ctx: &Context, filter: Option<String>) -> Result<()> {
    let filter = StatusFilter::parse(filter.as_deref())?;
    let session = open_session(ctx).await?;
    let view = session.engine().filtered(filter, today());

    if ctx.json {
        return emit_success(ctx.output(), "task list", &view, None);
    }
    if ctx.quiet {
        return Ok(());
    }

    if view.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    print_tree(&view, 0);
    Ok(())
}

pub async fn run_add(ctx: &Context, opts: AddOptions) -> Result<()> {
    let draft = NewTask {
        title: opts.title,
        parent_id: opts.parent,
        start_date: parse_date_arg(opts.start.as_deref())?,
        due_date: parse_date_arg(opts.due.as_deref())?,
        assignee: opts.assignee,
        category: opts
            .category
            .or_else(|| Some(ctx.config.tasks.default_category.clone())),
        status: parse_status_arg(opts.status.as_deref())?,
    };

    let mut session = open_session(ctx).await?;
    let outcome = session.create(draft).await?;

    ctx.emit_event(EventKind::TaskCreated, &outcome.value)?;
    let mut human = HumanOutput::new(format!(
        "Added task {} \"{}\"",
        outcome.value.id, outcome.value.title
    ));
    human.push_summary("status", outcome.value.status.as_str());
    if let Some(parent) = outcome.value.parent_id.as_deref() {
        human.push_summary("parent", parent);
    }
    surface_write_error(ctx, &mut human, &outcome.write_error)?;

    let data = MutationOutput {
        task: &outcome.value,
        synced: outcome.write_error.is_none(),
    };
    emit_success(ctx.output(), "task add", &data, Some(&human))
}

pub async fn run_edit(ctx: &Context, opts: EditOptions) -> Result<()> {
    let patch = TaskPatch {
        title: opts.title,
        start_date: parse_date_arg(opts.start.as_deref())?,
        due_date: parse_date_arg(opts.due.as_deref())?,
        assignee: opts.assignee,
        category: opts.category,
        parent_id: opts.parent,
    };

    let mut session = open_session(ctx).await?;
    let outcome = session.update(&opts.id, patch).await?;

    ctx.emit_event(EventKind::TaskUpdated, &outcome.value)?;
    let mut human = HumanOutput::new(format!("Updated task {}", outcome.value.id));
    surface_write_error(ctx, &mut human, &outcome.write_error)?;

    let data = MutationOutput {
        task: &outcome.value,
        synced: outcome.write_error.is_none(),
    };
    emit_success(ctx.output(), "task edit", &data, Some(&human))
}

pub async fn run_status(ctx: &Context, id: String, status: String) -> Result<()> {
    let status: Status = status.parse()?;
    let mut session = open_session(ctx).await?;
    let outcome = session.set_status(&id, status).await?;

    ctx.emit_event(EventKind::TaskUpdated, &outcome.value)?;
    let mut human = HumanOutput::new(format!(
        "Task {} is now {}",
        outcome.value.id,
        outcome.value.status.as_str()
    ));
    surface_write_error(ctx, &mut human, &outcome.write_error)?;

    let data = MutationOutput {
        task: &outcome.value,
        synced: outcome.write_error.is_none(),
    };
    emit_success(ctx.output(), "task status", &data, Some(&human))
}

pub async fn run_progress(ctx: &Context, id: String, value: u8) -> Result<()> {
    let mut session = open_session(ctx).await?;
    let outcome = session.set_progress(&id, value).await?;

    ctx.emit_event(EventKind::TaskUpdated, &outcome.value)?;
    let mut human = HumanOutput::new(format!(
        "Task {} at {}% ({})",
        outcome.value.id,
        outcome.value.progress,
        outcome.value.status.as_str()
    ));
    surface_write_error(ctx, &mut human, &outcome.write_error)?;

    let data = MutationOutput {
        task: &outcome.value,
        synced: outcome.write_error.is_none(),
    };
    emit_success(ctx.output(), "task progress", &data, Some(&human))
}

pub async fn run_check(ctx: &Context, id: String) -> Result<()> {
    let mut session = open_session(ctx).await?;
    let outcome = session.toggle_completed(&id).await?;

    ctx.emit_event(EventKind::TaskUpdated, &outcome.value)?;
    let header = if outcome.value.completed {
        format!("Task {} completed", outcome.value.id)
    } else {
        format!("Task {} reopened", outcome.value.id)
    };
    let mut human = HumanOutput::new(header);
    surface_write_error(ctx, &mut human, &outcome.write_error)?;

    let data = MutationOutput {
        task: &outcome.value,
        synced: outcome.write_error.is_none(),
    };
    emit_success(ctx.output(), "task check", &data, Some(&human))
}

pub async fn run_rm(ctx: &Context, id: String) -> Result<()> {
    let mut session = open_session(ctx).await?;
    let outcome = session.delete(&id).await?;

    ctx.emit_event(EventKind::TaskDeleted, &outcome.value)?;
    let mut human = HumanOutput::new(format!(
        "Deleted task {} \"{}\" and its subtree",
        outcome.value.id, outcome.value.title
    ));
    surface_write_error(ctx, &mut human, &outcome.write_error)?;

    let data = MutationOutput {
        task: &outcome.value,
        synced: outcome.write_error.is_none(),
    };
    emit_success(ctx.output(), "task rm", &data, Some(&human))
}

pub async fn run_batch(ctx: &Context, opts: BatchOptions) -> Result<()> {
    let change = batch_change(&opts)?;
    let ids: HashSet<String> = opts.ids.into_iter().collect();

    let mut session = open_session(ctx).await?;
    let outcome = session.batch_update(&ids, &change).await;

    ctx.emit_event(
        EventKind::BatchApplied,
        serde_json::json!({ "ids": outcome.value }),
    )?;
    let mut human = HumanOutput::new(format!("Updated {} task(s)", outcome.value.len()));
    let missing: Vec<&String> = ids
        .iter()
        .filter(|id| !outcome.value.contains(*id))
        .collect();
    for id in missing {
        human.push_warning(format!("no such task: {id}"));
    }
    surface_write_error(ctx, &mut human, &outcome.write_error)?;

    let data = BatchOutput {
        changed: &outcome.value,
        synced: outcome.write_error.is_none(),
    };
    emit_success(ctx.output(), "task batch", &data, Some(&human))
}

fn batch_change(opts: &BatchOptions) -> Result<BatchChange> {
    match (&opts.status, &opts.assignee, &opts.category) {
        (Some(status), None, None) => Ok(BatchChange::Status(status.parse()?)),
        (None, Some(assignee), None) => Ok(BatchChange::Assignee(assignee.clone())),
        (None, None, Some(category)) => Ok(BatchChange::Category(category.clone())),
        _ => Err(Error::InvalidArgument(
            "batch takes exactly one of --status, --assignee, --category".to_string(),
        )),
    }
}

fn surface_write_error(
    ctx: &Context,
    human: &mut HumanOutput,
    write_error: &Option<Error>,
) -> Result<()> {
    if let Some(err) = write_error {
        human.push_warning(format!("remote write failed: {err} (local change kept)"));
        ctx.emit_event(
            EventKind::WriteFailed,
            serde_json::json!({ "error": err.to_string() }),
        )?;
    }
    Ok(())
}

fn parse_date_arg(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                Error::InvalidArgument(format!("invalid date '{raw}': expected YYYY-MM-DD"))
            }),
    }
}

fn parse_status_arg(raw: Option<&str>) -> Result<Option<Status>> {
    raw.map(str::parse).transpose()
}

fn print_tree(nodes: &[TreeNode], depth: usize) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        let marker = if node.task.completed { "x" } else { " " };
        let mut extras = Vec::new();
        if let Some(due) = node.task.due_date {
            extras.push(format!("due {due}"));
        }
        if let Some(assignee) = node.task.assignee.as_deref() {
            extras.push(assignee.to_string());
        }
        let suffix = if extras.is_empty() {
            String::new()
        } else {
            format!(" ({})", extras.join(", "))
        };
        println!(
            "{indent}[{marker}] {} {} [{}]{suffix}",
            node.task.id,
            node.task.title,
            node.task.status.as_str()
        );
        print_tree(&node.children, depth + 1);
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}
