//! Fetch and watch (polling reconciliation) commands.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::cli::{open_session, Context};
use crate::engine::Engine;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind, EventSink};
use crate::output::{emit_success, HumanOutput};
use crate::sheets::SheetsClient;
use crate::sync::{Reconciler, SyncSession, TickOutcome};

pub async fn run_fetch(ctx: &Context) -> Result<()> {
    let session = open_session(ctx).await?;
    let tasks = session.engine().tasks();
    let progress = session.engine().global_progress();

    ctx.emit_event(
        EventKind::TasksLoaded,
        serde_json::json!({ "count": tasks.len(), "tasks": tasks }),
    )?;

    let mut human = HumanOutput::new(format!("Fetched {} task(s)", tasks.len()));
    human.push_summary("progress", format!("{progress}%"));
    let data = serde_json::json!({ "count": tasks.len(), "progress": progress });
    emit_success(ctx.output(), "fetch", &data, Some(&human))
}

pub async fn run_watch(ctx: &Context, interval: Option<u64>) -> Result<()> {
    let period_secs = interval.unwrap_or(ctx.config.poll.interval_secs).max(1);
    let sheet = ctx.config.require_sheet()?.clone();
    let client = SheetsClient::new(sheet, ctx.config.retry_policy());
    let mut session = SyncSession::new(Engine::new(), client);

    let sink: Option<Rc<RefCell<EventSink>>> = EventDestination::parse(ctx.events.as_deref())
        .map(|dest| dest.open())
        .transpose()?
        .map(|sink| Rc::new(RefCell::new(sink)));

    if let Some(sink) = &sink {
        let loaded_sink = Rc::clone(sink);
        session.engine_mut().on_tasks_loaded(move |tasks| {
            emit_quietly(
                &loaded_sink,
                EventKind::TasksLoaded,
                serde_json::json!({ "count": tasks.len(), "tasks": tasks }),
            );
        });

        let progress_sink = Rc::clone(sink);
        session.engine_mut().on_progress_changed(move |progress| {
            emit_quietly(
                &progress_sink,
                EventKind::ProgressChanged,
                serde_json::json!({ "progress": progress }),
            );
        });
    }

    if !ctx.quiet {
        println!("Watching sheet every {period_secs}s (Ctrl-C to stop)");
    }

    let reconciler = Reconciler::new(Duration::from_secs(period_secs));
    let quiet = ctx.quiet;
    let failure_sink = sink.clone();
    let observe = move |outcome: TickOutcome| match outcome {
        TickOutcome::Replaced(count) => {
            if !quiet {
                println!("reconciled: {count} task(s)");
            }
        }
        TickOutcome::Skipped => {
            tracing::debug!("poll skipped, write in flight");
        }
        TickOutcome::Failed(err) => {
            if !quiet {
                eprintln!("fetch failed: {err} (keeping last good state)");
            }
            if let Some(sink) = &failure_sink {
                emit_quietly(
                    sink,
                    EventKind::FetchFailed,
                    serde_json::json!({ "error": err.to_string() }),
                );
            }
        }
    };

    tokio::select! {
        _ = reconciler.run(&mut session, observe) => {}
        _ = tokio::signal::ctrl_c() => {
            if !ctx.quiet {
                println!("stopped");
            }
        }
    }
    Ok(())
}

fn emit_quietly(sink: &Rc<RefCell<EventSink>>, kind: EventKind, data: serde_json::Value) {
    if let Ok(event) = Event::new(kind).with_data(data) {
        if let Err(err) = sink.borrow_mut().emit(&event) {
            tracing::warn!(error = %err, "failed to emit event");
        }
    }
}
