//! Application state shared by the request handlers.

use std::sync::Arc;

use dca_data::store::{ExecutionLedger, StrategyStore};
use dca_engine::pipeline::ExecutionPipeline;
use dca_engine::provisioning::StrategyProvisioner;
use dca_engine::reconciler::LedgerReconciler;

/// Shared handles handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub provisioner: Arc<StrategyProvisioner>,
    pub pipeline: Arc<ExecutionPipeline>,
    pub reconciler: Arc<LedgerReconciler>,
    pub store: Arc<dyn StrategyStore>,
    pub ledger: Arc<dyn ExecutionLedger>,
}
