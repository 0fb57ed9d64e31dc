//! Execution record and response types

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::request::Action;

/// Ledger action marker for failures that happen before an action is known
pub const UNKNOWN_ACTION: &str = "unknown";

/// Identity of a single invocation, captured once at entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub execution_id: String,
    pub timestamp: DateTime<Utc>,
}

impl Invocation {
    pub fn new() -> Self {
        Self {
            execution_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl Default for Invocation {
    fn default() -> Self {
        Self::new()
    }
}

/// Final status of an invocation as stored in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Success,
    Skipped,
    Failed,
    Critical,
}

/// One immutable ledger entry per invocation
///
/// Constructed only through the status-specific constructors, so a
/// non-zero `instances_affected` is only ever paired with `Success`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub action: String,
    pub timestamp: String,
    pub instances_affected: usize,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ExecutionRecord {
    fn new(
        invocation: &Invocation,
        action: &str,
        instances_affected: usize,
        status: ExecutionStatus,
        error_message: Option<String>,
    ) -> Self {
        Self {
            execution_id: invocation.execution_id.clone(),
            action: action.to_string(),
            timestamp: invocation.timestamp_rfc3339(),
            instances_affected,
            status,
            error_message,
        }
    }

    pub fn succeeded(invocation: &Invocation, action: Action, instances_affected: usize) -> Self {
        Self::new(
            invocation,
            action.as_str(),
            instances_affected,
            ExecutionStatus::Success,
            None,
        )
    }

    pub fn skipped(invocation: &Invocation, action: Action, message: impl Into<String>) -> Self {
        Self::new(
            invocation,
            action.as_str(),
            0,
            ExecutionStatus::Skipped,
            Some(message.into()),
        )
    }

    /// `action` is the raw rendering for rejected requests, so it stays a string
    pub fn failed(invocation: &Invocation, action: &str, message: impl Into<String>) -> Self {
        Self::new(
            invocation,
            action,
            0,
            ExecutionStatus::Failed,
            Some(message.into()),
        )
    }

    pub fn critical(invocation: &Invocation, message: impl Into<String>) -> Self {
        Self::new(
            invocation,
            UNKNOWN_ACTION,
            0,
            ExecutionStatus::Critical,
            Some(message.into()),
        )
    }
}

pub const STATUS_OK: u16 = 200;
pub const STATUS_BAD_REQUEST: u16 = 400;
pub const STATUS_INTERNAL_ERROR: u16 = 500;

/// Parsed form of a response body: exactly one of `message` or `error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseBody {
    Message(String),
    Error(String),
}

/// Gateway-style response returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl Response {
    fn new(status_code: u16, body: serde_json::Value) -> Self {
        Self {
            status_code,
            headers: cors_headers(),
            body: body.to_string(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(STATUS_OK, serde_json::json!({ "message": message.into() }))
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(STATUS_BAD_REQUEST, serde_json::json!({ "error": error.into() }))
    }

    pub fn internal_error(error: impl Into<String>) -> Self {
        Self::new(
            STATUS_INTERNAL_ERROR,
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn parsed_body(&self) -> Result<ResponseBody, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

fn cors_headers() -> BTreeMap<String, String> {
    [
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Headers", "Content-Type"),
        ("Access-Control-Allow-Methods", "OPTIONS,POST"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
