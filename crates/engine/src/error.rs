use thiserror::Error;

use dca_data::store::StoreError;
use dca_domain::error::ValidationError;

/// Errors surfaced by the orchestration layer.
///
/// Guard rejections and downstream failures are not here: those are
/// ordinary pipeline outcomes, reported through `ExecutionReport` and the
/// ledger.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(ValidationError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Validation(err)
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        // Surface creation-time validation as its own class so callers can
        // report it synchronously.
        match err {
            StoreError::Validation(err) => EngineError::Validation(err),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    /// Whether the error is a missing-strategy lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::NotFound(_)))
    }
}
