//! trellis - Spreadsheet-backed task tracking library
//!
//! This library provides the core functionality for the trellis CLI tool:
//! it mirrors a flat, spreadsheet-resident task list into a hierarchical
//! project-tracking model and reconciles local edits back to the sheet.
//!
//! # Core Concepts
//!
//! - **Dot-delimited ids**: `"2"` is a phase, `"2.1"` its child, `"2.1.3"` a
//!   grandchild. The id is a display and sort key; runtime traversal uses
//!   explicit parent links resolved once per build.
//! - **Single owned store**: the flat task list is authoritative; the tree is
//!   a computed view rebuilt after every mutation.
//! - **Optimistic updates**: mutations commit locally first, then attempt a
//!   best-effort remote write. Failures surface as notifications, never as
//!   rollbacks.
//! - **Single-slot undo**: the most recent deletion can be restored exactly
//!   once.
//! - **Polling reconciliation**: a timer re-fetches the sheet and replaces
//!   local state wholesale, suppressed while a write is in flight.
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `trellis.toml`
//! - `error`: Error types and result aliases
//! - `task`: Task records, status rules, and id conventions
//! - `tree`: Flat records to rooted forest
//! - `filter`: Status predicates over the forest
//! - `board`: Global progress and kanban bucketing
//! - `engine`: Local mutations, undo, outward hooks
//! - `sheets`: Remote values-API adapter
//! - `sync`: Optimistic write session and polling reconciler
//! - `events`: JSONL event output for external integrations
//! - `output`: Shared CLI output formatting

pub mod board;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod filter;
pub mod output;
pub mod sheets;
pub mod sync;
pub mod task;
pub mod tree;

pub use error::{Error, Result};
