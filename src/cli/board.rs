//! Board, progress, and statistics views.

use crate::board;
use crate::cli::task::today;
use crate::cli::{open_session, Context};
use crate::error::Result;
use crate::filter::StatusFilter;
use crate::output::{emit_success, HumanOutput};
use crate::task::Status;

pub async fn run_board(ctx: &Context, filter: Option<String>) -> Result<()> {
    let filter = StatusFilter::parse(filter.as_deref())?;
    let session = open_session(ctx).await?;
    let columns = session.engine().kanban(filter, today());

    if ctx.json {
        let data: serde_json::Map<String, serde_json::Value> = columns
            .iter()
            .map(|(status, tasks)| {
                (
                    status.as_str().to_string(),
                    serde_json::to_value(tasks).unwrap_or_default(),
                )
            })
            .collect();
        return emit_success(ctx.output(), "board", &data, None);
    }
    if ctx.quiet {
        return Ok(());
    }

    for status in Status::ALL {
        let tasks = columns.get(&status).map(Vec::as_slice).unwrap_or_default();
        println!("{} ({})", status.label(), tasks.len());
        for task in tasks {
            println!("  {} {}", task.id, task.title);
        }
        println!();
    }
    Ok(())
}

pub async fn run_progress(ctx: &Context) -> Result<()> {
    let session = open_session(ctx).await?;
    let progress = session.engine().global_progress();

    if ctx.json {
        return emit_success(
            ctx.output(),
            "progress",
            &serde_json::json!({ "progress": progress }),
            None,
        );
    }
    if !ctx.quiet {
        println!("{progress}%");
    }
    Ok(())
}

pub async fn run_stats(ctx: &Context) -> Result<()> {
    let session = open_session(ctx).await?;
    let stats = board::stats(session.engine().tasks(), today());

    let mut human = HumanOutput::new("Dashboard statistics");
    human.push_summary("total", stats.total.to_string());
    human.push_summary("completed", stats.completed.to_string());
    human.push_summary("remaining", stats.remaining.to_string());
    human.push_summary("overdue", stats.overdue.to_string());
    if let Some(deadline) = stats.next_deadline {
        human.push_summary("next deadline", deadline.to_string());
    }

    emit_success(ctx.output(), "stats", &stats, Some(&human))
}
