//! Remote task store adapter.
//!
//! Speaks a spreadsheet values API: ranged reads keyed by sheet id and cell
//! range, and full-range overwrites on write. Rows map positionally into
//! task fields; the first row of every read is a header row and is
//! discarded, and every write regenerates it.
//!
//! The HTTP seam is the `ValuesTransport` trait so tests can script replies.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::config::SheetConfig;
use crate::error::{Error, Result};
use crate::task::{Status, Task};

/// Column order shared by reads and writes:
/// id, title, description (unused locally), status, start, due, assignee,
/// category.
pub const HEADER_ROW: [&str; 8] = [
    "ID",
    "Title",
    "Description",
    "Status",
    "Start Date",
    "Due Date",
    "Assignee",
    "Category",
];

/// Bounded retry for rate-limited reads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub read_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            read_attempts: 3,
            backoff_base_ms: 500,
        }
    }
}

/// A transport-level reply: HTTP status plus parsed JSON body (null when the
/// body is not JSON).
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

/// Minimal HTTP surface the adapter needs.
#[async_trait]
pub trait ValuesTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<Reply>;
    async fn put(&self, url: &str, body: Value) -> Result<Reply>;
}

/// reqwest-backed transport used outside tests.
#[derive(Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ValuesTransport for HttpTransport {
    async fn get(&self, url: &str) -> Result<Reply> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(Reply { status, body })
    }

    async fn put(&self, url: &str, body: Value) -> Result<Reply> {
        let response = self.client.put(url).json(&body).send().await?;
        let status = response.status().as_u16();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok(Reply { status, body })
    }
}

#[derive(Debug, Default, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Client for one configured sheet and range.
pub struct SheetsClient {
    sheet: SheetConfig,
    retry: RetryPolicy,
    transport: Box<dyn ValuesTransport>,
}

impl SheetsClient {
    pub fn new(sheet: SheetConfig, retry: RetryPolicy) -> Self {
        Self::with_transport(sheet, retry, Box::new(HttpTransport::new()))
    }

    pub fn with_transport(
        sheet: SheetConfig,
        retry: RetryPolicy,
        transport: Box<dyn ValuesTransport>,
    ) -> Self {
        Self {
            sheet,
            retry,
            transport,
        }
    }

    fn read_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}?key={}",
            self.sheet.base_url.trim_end_matches('/'),
            self.sheet.spreadsheet_id,
            self.sheet.range,
            self.sheet.api_key,
        )
    }

    fn write_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}?valueInputOption=RAW&key={}",
            self.sheet.base_url.trim_end_matches('/'),
            self.sheet.spreadsheet_id,
            self.sheet.range,
            self.sheet.api_key,
        )
    }

    /// Ranged read of the full task list. HTTP 429 retries with exponential
    /// backoff up to the configured attempt cap; exhaustion and any other
    /// non-2xx leave the caller's previous state untouched.
    pub async fn read_tasks(&self) -> Result<Vec<Task>> {
        let url = self.read_url();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let reply = self.transport.get(&url).await?;

            if reply.status == 429 {
                if attempt >= self.retry.read_attempts {
                    return Err(Error::RateLimited { attempts: attempt });
                }
                let exponent = (attempt - 1).min(16);
                let delay_ms = self.retry.backoff_base_ms.saturating_mul(1 << exponent);
                tracing::debug!(attempt, delay_ms, "remote store rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                continue;
            }

            if !(200..300).contains(&reply.status) {
                return Err(Error::RemoteStatus {
                    operation: "read",
                    status: reply.status,
                });
            }

            let parsed: ValuesResponse = serde_json::from_value(reply.body)?;
            return Ok(rows_to_tasks(&parsed.values));
        }
    }

    /// Full-range overwrite of the configured range with the entire task
    /// list. There is no partial or row-level update.
    pub async fn write_tasks(&self, tasks: &[Task]) -> Result<()> {
        let url = self.write_url();
        let body = serde_json::json!({ "values": tasks_to_rows(tasks) });
        let reply = self.transport.put(&url, body).await?;

        if !(200..300).contains(&reply.status) {
            return Err(Error::RemoteStatus {
                operation: "write",
                status: reply.status,
            });
        }
        Ok(())
    }
}

/// Map raw sheet rows into task records, discarding the header row and
/// skipping rows with every cell blank.
pub fn rows_to_tasks(values: &[Vec<String>]) -> Vec<Task> {
    values
        .iter()
        .skip(1)
        .filter_map(|row| row_to_task(row))
        .collect()
}

fn row_to_task(row: &[String]) -> Option<Task> {
    if row.iter().all(|value| value.trim().is_empty()) {
        return None;
    }

    let id = cell(row, 0)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let title = cell(row, 1).unwrap_or("Untitled task").to_string();
    let status = Status::from_sheet(cell(row, 3).unwrap_or(""));
    let completed = status == Status::Completed;

    Some(Task {
        id,
        title,
        status,
        completed,
        start_date: cell(row, 4).and_then(parse_date),
        due_date: cell(row, 5).and_then(parse_date),
        assignee: cell(row, 6).map(str::to_string),
        category: cell(row, 7).map(str::to_string),
        // The wire format carries no progress column.
        progress: if completed { 100 } else { 0 },
        parent_id: None,
    })
}

/// Serialize the task list back into row-major values, header row first.
pub fn tasks_to_rows(tasks: &[Task]) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(tasks.len() + 1);
    rows.push(HEADER_ROW.iter().map(|name| name.to_string()).collect());
    for task in tasks {
        rows.push(vec![
            task.id.clone(),
            task.title.clone(),
            String::new(),
            task.status.as_str().to_string(),
            task.start_date.map(|date| date.to_string()).unwrap_or_default(),
            task.due_date.map(|date| date.to_string()).unwrap_or_default(),
            task.assignee.clone().unwrap_or_default(),
            task.category.clone().unwrap_or_default(),
        ]);
    }
    rows
}

fn cell(row: &[String], idx: usize) -> Option<&str> {
    row.get(idx).map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
