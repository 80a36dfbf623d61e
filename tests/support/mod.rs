#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use trellis::config::SheetConfig;
use trellis::engine::Engine;
use trellis::error::Result;
use trellis::sheets::{Reply, RetryPolicy, SheetsClient, ValuesTransport};
use trellis::sync::SyncSession;
use trellis::task::{Status, Task};

pub fn task(id: &str, title: &str) -> Task {
    Task::new(id, title)
}

pub fn task_with_status(id: &str, status: Status) -> Task {
    let mut task = Task::new(id, format!("Task {id}"));
    task.set_status(status);
    task
}

pub fn leaf_with_progress(id: &str, progress: u8) -> Task {
    let mut task = Task::new(id, format!("Task {id}"));
    task.set_progress(progress);
    task
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn sheet_body(rows: &[&[&str]]) -> Value {
    let values: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    serde_json::json!({ "values": values })
}

/// Scripted transport standing in for the values API. Queued GET replies are
/// consumed in order (an empty queue answers with an empty sheet); PUT
/// bodies are recorded and answer with queued statuses, defaulting to 200.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    get_replies: Arc<Mutex<VecDeque<Reply>>>,
    put_statuses: Arc<Mutex<VecDeque<u16>>>,
    pub puts: Arc<Mutex<Vec<Value>>>,
    pub get_count: Arc<Mutex<u32>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_get(&self, reply: Reply) {
        self.get_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_get_rows(&self, rows: &[&[&str]]) {
        self.push_get(Reply {
            status: 200,
            body: sheet_body(rows),
        });
    }

    pub fn push_get_status(&self, status: u16) {
        self.push_get(Reply {
            status,
            body: Value::Null,
        });
    }

    pub fn push_put_status(&self, status: u16) {
        self.put_statuses.lock().unwrap().push_back(status);
    }

    pub fn recorded_puts(&self) -> Vec<Value> {
        self.puts.lock().unwrap().clone()
    }

    pub fn gets(&self) -> u32 {
        *self.get_count.lock().unwrap()
    }
}

#[async_trait]
impl ValuesTransport for ScriptedTransport {
    async fn get(&self, _url: &str) -> Result<Reply> {
        *self.get_count.lock().unwrap() += 1;
        let reply = self.get_replies.lock().unwrap().pop_front();
        Ok(reply.unwrap_or(Reply {
            status: 200,
            body: serde_json::json!({ "values": [] }),
        }))
    }

    async fn put(&self, _url: &str, body: Value) -> Result<Reply> {
        self.puts.lock().unwrap().push(body);
        let status = self
            .put_statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(200);
        Ok(Reply {
            status,
            body: Value::Null,
        })
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        read_attempts: 3,
        backoff_base_ms: 1,
    }
}

pub fn scripted_client(transport: &ScriptedTransport, retry: RetryPolicy) -> SheetsClient {
    SheetsClient::with_transport(SheetConfig::default(), retry, Box::new(transport.clone()))
}

pub fn scripted_session(transport: &ScriptedTransport) -> SyncSession {
    SyncSession::new(Engine::new(), scripted_client(transport, fast_retry()))
}
