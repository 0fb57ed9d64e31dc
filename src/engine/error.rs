//! Pipeline error types

use crate::bridge::{LedgerError, ProviderError};
use crate::request::RequestShapeError;

/// Errors that abort an invocation's pipeline
///
/// `Provider` is classified and answered locally with a `FAILED` record.
/// Everything else is unexpected and ends the invocation as `CRITICAL`.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    RequestShape(#[from] RequestShapeError),
}
