//! Optimistic remote synchronization and the polling reconciler.
//!
//! Every mutation commits to local state first, then attempts a best-effort
//! remote write; on failure the local state is kept and the error is carried
//! back for the caller to surface. A single boolean in-flight flag is the
//! only mutual-exclusion device: it gates the reconciliation poll against a
//! concurrent write, and nothing else. Two rapid mutations can still race
//! their remote writes, which then resolve by completion order.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};

use crate::engine::{BatchChange, Engine, NewTask, TaskPatch};
use crate::error::{Error, Result};
use crate::sheets::SheetsClient;
use crate::task::{Status, Task};

/// A locally committed mutation plus the outcome of its remote write. A
/// write failure never rolls the local value back.
#[derive(Debug)]
pub struct Synced<T> {
    pub value: T,
    pub write_error: Option<Error>,
}

/// Engine plus remote client, mutating both in the optimistic order:
/// local commit, then full-range write.
pub struct SyncSession {
    engine: Engine,
    client: SheetsClient,
    write_in_flight: Arc<AtomicBool>,
}

impl SyncSession {
    pub fn new(engine: Engine, client: SheetsClient) -> Self {
        Self {
            engine,
            client,
            write_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// The in-flight flag shared with the reconciler.
    pub fn in_flight_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.write_in_flight)
    }

    /// Re-read the sheet and replace local state wholesale.
    pub async fn refresh(&mut self) -> Result<usize> {
        let tasks = self.client.read_tasks().await?;
        let count = tasks.len();
        self.engine.replace_all(tasks);
        Ok(count)
    }

    /// One reconciliation tick. Skipped (`None`) while a write is in flight
    /// so stale remote data cannot clobber a not-yet-persisted local edit.
    /// A local edit whose write has already completed is still subject to
    /// the wholesale replacement; that race is accepted, not resolved.
    pub async fn poll_tick(&mut self) -> Result<Option<usize>> {
        if self.write_in_flight.load(Ordering::SeqCst) {
            tracing::debug!("write in flight, skipping reconciliation poll");
            return Ok(None);
        }
        self.refresh().await.map(Some)
    }

    pub async fn create(&mut self, draft: NewTask) -> Result<Synced<Task>> {
        let task = self.engine.create(draft, today())?;
        let write_error = self.push().await;
        Ok(Synced {
            value: task,
            write_error,
        })
    }

    pub async fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Synced<Task>> {
        let task = self.engine.update(id, patch)?;
        let write_error = self.push().await;
        Ok(Synced {
            value: task,
            write_error,
        })
    }

    pub async fn set_status(&mut self, id: &str, status: Status) -> Result<Synced<Task>> {
        let task = self.engine.set_status(id, status)?;
        let write_error = self.push().await;
        Ok(Synced {
            value: task,
            write_error,
        })
    }

    pub async fn set_progress(&mut self, id: &str, progress: u8) -> Result<Synced<Task>> {
        let task = self.engine.set_progress(id, progress)?;
        let write_error = self.push().await;
        Ok(Synced {
            value: task,
            write_error,
        })
    }

    pub async fn toggle_completed(&mut self, id: &str) -> Result<Synced<Task>> {
        let task = self.engine.toggle_completed(id)?;
        let write_error = self.push().await;
        Ok(Synced {
            value: task,
            write_error,
        })
    }

    pub async fn delete(&mut self, id: &str) -> Result<Synced<Task>> {
        let task = self.engine.delete(id)?;
        let write_error = self.push().await;
        Ok(Synced {
            value: task,
            write_error,
        })
    }

    /// Restore the buffered deletion. `None` when the buffer is empty; no
    /// write is attempted in that case.
    pub async fn undo_delete(&mut self) -> Option<Synced<Task>> {
        let task = self.engine.undo_delete()?;
        let write_error = self.push().await;
        Some(Synced {
            value: task,
            write_error,
        })
    }

    /// Apply one field change across a selected id set in a single remote
    /// write attempt.
    pub async fn batch_update(
        &mut self,
        ids: &HashSet<String>,
        change: &BatchChange,
    ) -> Synced<Vec<String>> {
        let changed = self.engine.batch_update(ids, change);
        let write_error = if changed.is_empty() {
            None
        } else {
            self.push().await
        };
        Synced {
            value: changed,
            write_error,
        }
    }

    async fn push(&mut self) -> Option<Error> {
        self.write_in_flight.store(true, Ordering::SeqCst);
        let result = self.client.write_tasks(self.engine.tasks()).await;
        self.write_in_flight.store(false, Ordering::SeqCst);

        match result {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(error = %err, "remote write failed, keeping local state");
                Some(err)
            }
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// What one reconciliation tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Local state replaced with this many remote tasks.
    Replaced(usize),
    /// Skipped because a write was in flight.
    Skipped,
    /// Fetch failed; the last good state was retained.
    Failed(Error),
}

/// Fixed-interval reconciliation driver.
pub struct Reconciler {
    period: Duration,
}

impl Reconciler {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    /// Poll forever, reporting each tick to the observer. Fetch failures are
    /// reported and polling continues; the loop never stops on its own, so
    /// callers race it against their own shutdown signal.
    pub async fn run<F>(&self, session: &mut SyncSession, mut observe: F)
    where
        F: FnMut(TickOutcome),
    {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let outcome = match session.poll_tick().await {
                Ok(Some(count)) => TickOutcome::Replaced(count),
                Ok(None) => TickOutcome::Skipped,
                Err(err) => TickOutcome::Failed(err),
            };
            observe(outcome);
        }
    }
}
