//! Lifecycle Orchestrator - runs one power-on/power-off invocation
//!
//! The pipeline:
//! 1. Resolves the request shape and validates the action
//! 2. Derives the state instances must currently be in
//! 3. Filters the tagged inventory down to instances that need changing
//! 4. Issues the start/stop call when there is anything to change
//! 5. Writes exactly one execution record, then notifies and responds

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::bridge::{
    ComputeControl, ComputeInventory, ExecutionLedger, NotificationChannel, ProviderError,
};
use crate::engine::error::PipelineError;
use crate::engine::inventory::InventoryFilter;
use crate::engine::notifier::Notifier;
use crate::engine::result::{ExecutionRecord, Invocation, Response};
use crate::request::{validate_action, Action, InboundRequest};

/// Collaborator handles, built once per process and shared by invocations
#[derive(Clone)]
pub struct Services {
    pub inventory: Arc<dyn ComputeInventory>,
    pub control: Arc<dyn ComputeControl>,
    pub ledger: Arc<dyn ExecutionLedger>,
    pub channel: Arc<dyn NotificationChannel>,
}

/// Terminal phase an invocation ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Action missing or invalid
    Rejected,
    /// Nothing in the source state
    NoTargets,
    /// Transition issued
    Succeeded,
    /// Inventory or control call failed
    ProviderFailed,
    /// Unexpected failure anywhere in the pipeline
    Critical,
}

/// What a single invocation produced
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub execution_id: String,
    pub phase: Phase,
    pub response: Response,
}

pub struct Orchestrator {
    control: Arc<dyn ComputeControl>,
    ledger: Arc<dyn ExecutionLedger>,
    filter: InventoryFilter,
    notifier: Notifier,
    call_timeout: Duration,
}

impl Orchestrator {
    pub fn new(services: Services, tag_key: &str, tag_value: &str, call_timeout: Duration) -> Self {
        Self {
            control: services.control,
            ledger: services.ledger,
            filter: InventoryFilter::new(services.inventory, tag_key, tag_value),
            notifier: Notifier::new(services.channel, call_timeout),
            call_timeout,
        }
    }

    /// Handle a raw request and return the caller-facing response
    pub async fn handle(&self, event: &Value) -> Response {
        self.invoke(event).await.response
    }

    /// Handle a raw request under a fresh execution id
    pub async fn invoke(&self, event: &Value) -> InvocationOutcome {
        self.invoke_with(&Invocation::new(), event).await
    }

    /// Handle a raw request under a caller-supplied invocation identity
    #[instrument(skip(self, invocation, event), fields(execution_id = %invocation.execution_id))]
    pub async fn invoke_with(&self, invocation: &Invocation, event: &Value) -> InvocationOutcome {
        let (phase, response) = match self.run(invocation, event).await {
            Ok(outcome) => outcome,
            Err(e) => (Phase::Critical, self.critical(invocation, e).await),
        };

        info!(?phase, status_code = response.status_code, "Invocation finished");
        InvocationOutcome {
            execution_id: invocation.execution_id.clone(),
            phase,
            response,
        }
    }

    async fn run(
        &self,
        invocation: &Invocation,
        event: &Value,
    ) -> Result<(Phase, Response), PipelineError> {
        let request = InboundRequest::resolve(event)?;

        let action = match validate_action(&request) {
            Ok(action) => action,
            Err(rejection) => {
                let message = rejection.to_string();
                warn!(value = %rejection.value, "Rejected request");
                self.record(ExecutionRecord::failed(invocation, &rejection.value, &message))
                    .await?;
                return Ok((Phase::Rejected, Response::bad_request(message)));
            }
        };

        match self.execute(invocation, action).await {
            Err(PipelineError::Provider(e)) => {
                error!(%action, code = %e.code, "Provider call failed: {}", e.message);
                self.record(ExecutionRecord::failed(invocation, action.as_str(), &e.message))
                    .await?;
                self.notifier.notify_failure(action, &e.message).await;
                Ok((Phase::ProviderFailed, Response::bad_request(e.message)))
            }
            other => other,
        }
    }

    async fn execute(
        &self,
        invocation: &Invocation,
        action: Action,
    ) -> Result<(Phase, Response), PipelineError> {
        let source_state = action.source_state();
        debug!(%action, %source_state, "Filtering inventory");

        let instance_ids = self
            .bounded("Inventory", self.filter.find(source_state))
            .await?;

        if instance_ids.is_empty() {
            let message = format!(
                "No instances found with tag {} in state '{}'",
                self.filter.predicate(),
                source_state
            );
            info!(%action, "{}", message);
            self.record(ExecutionRecord::skipped(invocation, action, &message))
                .await?;
            return Ok((Phase::NoTargets, Response::success(message)));
        }

        info!(%action, instances = instance_ids.len(), "Changing instance state");
        self.bounded("Control", self.control.change_state(&instance_ids, action))
            .await?;

        self.record(ExecutionRecord::succeeded(invocation, action, instance_ids.len()))
            .await?;
        self.notifier.notify_success(action, &instance_ids).await;

        Ok((
            Phase::Succeeded,
            Response::success(format!(
                "Successfully {} {} instance(s)",
                action.past_tense(),
                instance_ids.len()
            )),
        ))
    }

    /// Record an unexpected failure as CRITICAL and answer generically
    async fn critical(&self, invocation: &Invocation, failure: PipelineError) -> Response {
        error!(error = %failure, "Invocation failed unexpectedly");

        let description = failure.to_string();
        if let Err(e) = self
            .record(ExecutionRecord::critical(invocation, &description))
            .await
        {
            error!(error = %e, "Failed to record critical failure");
        }

        Response::internal_error(format!("Internal Error: {}", description))
    }

    /// Ledger writes are never abandoned mid-flight: a dropped write may
    /// still land, and the follow-up CRITICAL record would then contradict
    /// it. Backends bound their own latency (HTTP client timeout).
    async fn record(&self, record: ExecutionRecord) -> Result<(), PipelineError> {
        self.ledger.put_record(&record).await?;
        info!(
            status = ?record.status,
            action = %record.action,
            instances = record.instances_affected,
            "Execution recorded"
        );
        Ok(())
    }

    async fn bounded<T>(
        &self,
        service: &str,
        call: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.call_timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(ProviderError::new(
                    "Timeout",
                    format!("{} call timed out after {}ms", service, self.timeout_ms()),
                ))
            })
    }

    fn timeout_ms(&self) -> u64 {
        self.call_timeout.as_millis() as u64
    }
}
