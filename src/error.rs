//! Error types for trellis
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, validation, unknown task)
//! - 4: Operation failed (remote store, IO, serialization)

use chrono::NaiveDate;
use thiserror::Error;

/// Exit codes for the trellis CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for trellis operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Task title must not be empty")]
    EmptyTitle,

    #[error("Due date {due} precedes start date {start}")]
    DateOrder { start: NaiveDate, due: NaiveDate },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task {0} would become its own ancestor")]
    CyclicParent(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Operation failures (exit code 4)
    #[error("Remote store returned HTTP {status} on {operation}")]
    RemoteStatus { operation: &'static str, status: u16 },

    #[error("Rate limited by remote store ({attempts} attempts)")]
    RateLimited { attempts: u32 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::EmptyTitle
            | Error::DateOrder { .. }
            | Error::TaskNotFound(_)
            | Error::CyclicParent(_)
            | Error::InvalidArgument(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            // Operation failures
            Error::RemoteStatus { .. }
            | Error::RateLimited { .. }
            | Error::Http(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured details for JSON error envelopes, where useful.
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::RemoteStatus { operation, status } => Some(serde_json::json!({
                "operation": operation,
                "status": status,
            })),
            Error::RateLimited { attempts } => Some(serde_json::json!({
                "attempts": attempts,
            })),
            _ => None,
        }
    }
}

/// Result type alias for trellis operations
pub type Result<T> = std::result::Result<T, Error>;
