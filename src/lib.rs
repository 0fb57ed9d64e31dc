//! # Compute Toggle
//!
//! On-demand power-on/power-off of a tagged group of compute instances.
//!
//! Each invocation validates the requested action, looks up the tagged
//! instances that are in the state the action leaves (stopped instances for
//! `start`, running instances for `stop`), issues the transition, writes one
//! record to an append-only execution ledger and notifies operators.
//!
//! ## Features
//!
//! - **Two request shapes** - direct `{"action": ..}` or a gateway envelope with a JSON `body`
//! - **No-op aware** - instances already in the target state are never touched
//! - **Exactly one ledger record** per invocation, on every exit path
//! - **Best-effort notifications** - delivery failures never affect the outcome
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use compute_toggle::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::from_env()?;
//!     let services = ServicesConfig::default().build(&settings)?;
//!     let orchestrator = Orchestrator::new(
//!         services,
//!         &settings.tag_key,
//!         &settings.tag_value,
//!         settings.call_timeout(),
//!     );
//!
//!     let response = orchestrator
//!         .handle(&serde_json::json!({ "action": "start" }))
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&response)?);
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod engine;
pub mod request;

// Re-export main types
pub use bridge::{
    ComputeControl, ComputeInventory, ExecutionLedger, FileLedger, HttpCompute, HttpLedger,
    InstancePage, InstanceQuery, InstanceSummary, LedgerError, LifecycleState, LogChannel,
    MemoryLedger, NotificationChannel, NotifyError, ProviderError, WebhookChannel,
};
pub use config::{ConfigError, ServicesConfig, Settings};
pub use engine::{
    ExecutionRecord, ExecutionStatus, Invocation, InvocationOutcome, Orchestrator, Phase,
    PipelineError, Response, ResponseBody, Services,
};
pub use request::{validate_action, Action, InboundRequest, ValidationError};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bridge::{
        ComputeControl, ComputeInventory, ExecutionLedger, LifecycleState, NotificationChannel,
        ProviderError,
    };
    pub use crate::config::{ConfigError, ServicesConfig, Settings};
    pub use crate::engine::{
        ExecutionRecord, ExecutionStatus, Invocation, InvocationOutcome, Orchestrator, Phase,
        Response, ResponseBody, Services,
    };
    pub use crate::request::{Action, InboundRequest};
}
