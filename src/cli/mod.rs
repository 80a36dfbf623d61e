//! Command-line interface for trellis
//!
//! This module defines the CLI structure using clap derive macros. Remote
//! commands run on a current-thread tokio runtime: execution stays
//! single-threaded and event-driven, with async calls suspending the caller
//! until the remote store answers.

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;
use crate::events::{Event, EventDestination, EventKind};
use crate::sheets::SheetsClient;
use crate::sync::SyncSession;

mod board;
mod task;
mod watch;

/// trellis - spreadsheet-backed task tracking
///
/// Mirrors a flat task sheet into a hierarchical project view, applies local
/// edits optimistically, and reconciles against the sheet on a timer.
#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./trellis.toml)
    #[arg(long, global = true, env = "TRELLIS_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    /// Emit structured events as JSONL to a file, or '-' for stdout
    #[arg(long, global = true)]
    pub events: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch the task list from the remote sheet
    Fetch,

    /// Show the kanban board, optionally filtered by status
    Board {
        /// Status filter: all, completed, in_progress, pending
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show global progress over leaf tasks
    Progress,

    /// Show dashboard statistics
    Stats,

    /// Poll the sheet on an interval and reconcile local state
    Watch {
        /// Seconds between polls (defaults to poll.interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Task management (create, edit, delete, batch updates)
    #[command(subcommand)]
    Task(TaskCommands),
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks as an indented tree
    List {
        /// Status filter: all, completed, in_progress, pending
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Add a task under a parent, or at the root
    Add {
        /// Task title
        title: String,

        /// Parent task id (omit for a new root phase)
        #[arg(long)]
        parent: Option<String>,

        /// Start date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        start: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Assignee label
        #[arg(long)]
        assignee: Option<String>,

        /// Category label (defaults to tasks.default_category)
        #[arg(long)]
        category: Option<String>,

        /// Initial status: not_started, in_progress, completed, pending
        #[arg(long)]
        status: Option<String>,
    },

    /// Edit a task's fields by id
    Edit {
        /// Task id
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New start date (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// New due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// New assignee
        #[arg(long)]
        assignee: Option<String>,

        /// New category
        #[arg(long)]
        category: Option<String>,

        /// New parent id (rejected if it would create a cycle)
        #[arg(long)]
        parent: Option<String>,
    },

    /// Set a task's status directly
    Status {
        /// Task id
        id: String,

        /// not_started, in_progress, completed, pending
        status: String,
    },

    /// Move a task's progress slider (0 and 100 force the adjacent state)
    Progress {
        /// Task id
        id: String,

        /// Progress value, 0-100
        value: u8,
    },

    /// Toggle the completion checkbox
    Check {
        /// Task id
        id: String,
    },

    /// Delete a task and its entire subtree
    Rm {
        /// Task id
        id: String,
    },

    /// Apply one field change to a set of tasks in a single write
    Batch {
        /// Selected task ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Set status on every selected task
        #[arg(long)]
        status: Option<String>,

        /// Set assignee on every selected task
        #[arg(long)]
        assignee: Option<String>,

        /// Set category on every selected task
        #[arg(long)]
        category: Option<String>,
    },
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let config = Config::load(self.config.as_deref())?;
        let ctx = Context {
            config,
            events: self.events,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Fetch => runtime.block_on(watch::run_fetch(&ctx)),
            Commands::Board { filter } => runtime.block_on(board::run_board(&ctx, filter)),
            Commands::Progress => runtime.block_on(board::run_progress(&ctx)),
            Commands::Stats => runtime.block_on(board::run_stats(&ctx)),
            Commands::Watch { interval } => runtime.block_on(watch::run_watch(&ctx, interval)),
            Commands::Task(cmd) => match cmd {
                TaskCommands::List { filter } => runtime.block_on(task::run_list(&ctx, filter)),
                TaskCommands::Add {
                    title,
                    parent,
                    start,
                    due,
                    assignee,
                    category,
                    status,
                } => runtime.block_on(task::run_add(
                    &ctx,
                    task::AddOptions {
                        title,
                        parent,
                        start,
                        due,
                        assignee,
                        category,
                        status,
                    },
                )),
                TaskCommands::Edit {
                    id,
                    title,
                    start,
                    due,
                    assignee,
                    category,
                    parent,
                } => runtime.block_on(task::run_edit(
                    &ctx,
                    task::EditOptions {
                        id,
                        title,
                        start,
                        due,
                        assignee,
                        category,
                        parent,
                    },
                )),
                TaskCommands::Status { id, status } => {
                    runtime.block_on(task::run_status(&ctx, id, status))
                }
                TaskCommands::Progress { id, value } => {
                    runtime.block_on(task::run_progress(&ctx, id, value))
                }
                TaskCommands::Check { id } => runtime.block_on(task::run_check(&ctx, id)),
                TaskCommands::Rm { id } => runtime.block_on(task::run_rm(&ctx, id)),
                TaskCommands::Batch {
                    ids,
                    status,
                    assignee,
                    category,
                } => runtime.block_on(task::run_batch(
                    &ctx,
                    task::BatchOptions {
                        ids,
                        status,
                        assignee,
                        category,
                    },
                )),
            },
        }
    }
}

/// Shared per-invocation context for command runners.
pub(crate) struct Context {
    pub config: Config,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Context {
    pub(crate) fn output(&self) -> crate::output::OutputOptions {
        crate::output::OutputOptions {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Emit a structured event when an events destination is configured.
    pub(crate) fn emit_event<T: serde::Serialize>(&self, kind: EventKind, data: T) -> Result<()> {
        if let Some(dest) = EventDestination::parse(self.events.as_deref()) {
            let mut sink = dest.open()?;
            sink.emit(&Event::new(kind).with_data(data)?)?;
        }
        Ok(())
    }
}

/// Open a sync session against the configured sheet and prime it with an
/// initial fetch.
pub(crate) async fn open_session(ctx: &Context) -> Result<SyncSession> {
    let sheet = ctx.config.require_sheet()?.clone();
    let client = SheetsClient::new(sheet, ctx.config.retry_policy());
    let mut session = SyncSession::new(Engine::new(), client);
    session.refresh().await?;
    Ok(session)
}
