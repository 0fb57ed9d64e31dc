//! Lifecycle engine module
//!
//! This module contains:
//! - `orchestrator` - Sequences one invocation and owns its failure policy
//! - `inventory` - Inventory Filter over the compute inventory
//! - `notifier` - Best-effort outcome notifications
//! - `result` - Execution records and caller-facing responses
//! - `error` - Pipeline error types

pub mod error;
pub mod inventory;
pub mod notifier;
pub mod orchestrator;
pub mod result;

pub use error::PipelineError;
pub use inventory::InventoryFilter;
pub use notifier::Notifier;
pub use orchestrator::{InvocationOutcome, Orchestrator, Phase, Services};
pub use result::{
    ExecutionRecord, ExecutionStatus, Invocation, Response, ResponseBody, STATUS_BAD_REQUEST,
    STATUS_INTERNAL_ERROR, STATUS_OK, UNKNOWN_ACTION,
};
