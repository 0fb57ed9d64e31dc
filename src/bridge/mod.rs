//! Bridge modules for external service communication
//!
//! Every collaborator the orchestrator talks to sits behind one of the
//! traits in this module, so the pipeline can run against real backends or
//! scripted fakes:
//! - `compute`: compute inventory and control over a JSON/HTTP provider API
//! - `ledger`: append-only execution ledger (memory, JSON Lines file, HTTP)
//! - `notify`: best-effort notification channels (log, webhook)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::result::ExecutionRecord;
use crate::request::Action;

pub mod compute;
pub mod http;
pub mod ledger;
pub mod notify;

pub use compute::HttpCompute;
pub use ledger::{FileLedger, HttpLedger, MemoryLedger};
pub use notify::{LogChannel, WebhookChannel};

/// Error returned by the compute provider (inventory or control call)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// The provider could not be reached or did not answer in time
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new("TransportError", message)
    }
}

/// Errors raised by execution ledger backends
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Conflicting record already stored for execution {0}")]
    Conflict(String),

    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    #[error("Ledger unreachable: {0}")]
    Transport(String),
}

/// Errors raised by notification channels
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Channel rejected message: {status} - {message}")]
    Rejected { status: u16, message: String },

    #[error("Channel unreachable: {0}")]
    Transport(String),
}

/// Lifecycle state reported by the compute provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Pending,
    Running,
    Stopping,
    Stopped,
    /// Any state this crate never acts on (terminated, shutting-down, ...)
    #[serde(other)]
    Other,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Pending => "pending",
            LifecycleState::Running => "running",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Stopped => "stopped",
            LifecycleState::Other => "other",
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag predicate plus lifecycle state, ANDed by the inventory service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceQuery {
    pub tag_key: String,
    pub tag_value: String,
    pub state: LifecycleState,
}

/// One instance as reported by the inventory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub instance_id: String,
    pub state: LifecycleState,
}

/// One page of an inventory listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePage {
    #[serde(default)]
    pub instances: Vec<InstanceSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Compute Inventory Service: lists instances matching a query
#[async_trait]
pub trait ComputeInventory: Send + Sync {
    /// Fetch one page of instances; `next_token` continues a previous listing
    async fn describe_instances(
        &self,
        query: &InstanceQuery,
        next_token: Option<&str>,
    ) -> Result<InstancePage, ProviderError>;
}

/// Compute Control Service: issues start/stop transitions
#[async_trait]
pub trait ComputeControl: Send + Sync {
    async fn change_state(&self, instance_ids: &[String], action: Action)
        -> Result<(), ProviderError>;
}

/// Append-only store of execution records keyed by execution id
#[async_trait]
pub trait ExecutionLedger: Send + Sync {
    async fn put_record(&self, record: &ExecutionRecord) -> Result<(), LedgerError>;
}

/// Fire-and-forget message delivery
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotifyError>;
}
