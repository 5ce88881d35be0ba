//! Ledger/counter reconciliation.
//!
//! The ledger is the sole source of truth for historical spend. The
//! reconciler recomputes a strategy's executed amount by summing its
//! approved-executed entries and reports any drift against the store
//! counter; agreement between the two is an invariant the test-suite
//! asserts after every scenario.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use dca_data::store::{ExecutionLedger, StoreError, StrategyStore};
use dca_domain::entities::StrategyId;

use crate::error::EngineError;

/// Comparison of a strategy's counter against its ledger history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub strategy_id: StrategyId,
    /// Executed amount according to the strategy store.
    pub counter_amount: Decimal,
    /// Executed amount recomputed from approved-executed ledger entries.
    pub ledger_amount: Decimal,
    pub in_sync: bool,
}

impl ReconcileReport {
    /// Counter minus ledger; zero when in sync.
    pub fn drift(&self) -> Decimal {
        self.counter_amount - self.ledger_amount
    }
}

/// Recomputes executed amounts from the ledger and flags drift.
pub struct LedgerReconciler {
    store: Arc<dyn StrategyStore>,
    ledger: Arc<dyn ExecutionLedger>,
}

impl LedgerReconciler {
    pub fn new(store: Arc<dyn StrategyStore>, ledger: Arc<dyn ExecutionLedger>) -> Self {
        Self { store, ledger }
    }

    /// Reconciles one strategy.
    pub async fn reconcile(&self, id: StrategyId) -> Result<ReconcileReport, EngineError> {
        let strategy = self
            .store
            .get(id)
            .await?
            .ok_or(StoreError::NotFound(id))
            .map_err(EngineError::from)?;
        let ledger_amount = self.ledger.executed_total(id).await?;
        let in_sync = ledger_amount == strategy.executed_amount;

        if in_sync {
            debug!(strategy = %id, amount = %ledger_amount, "counter agrees with ledger");
        } else {
            warn!(
                strategy = %id,
                counter = %strategy.executed_amount,
                ledger = %ledger_amount,
                "executed-amount drift detected"
            );
        }

        Ok(ReconcileReport {
            strategy_id: id,
            counter_amount: strategy.executed_amount,
            ledger_amount,
            in_sync,
        })
    }

    /// Reconciles every known strategy.
    pub async fn reconcile_all(&self) -> Result<Vec<ReconcileReport>, EngineError> {
        let strategies = self.store.list().await?;
        let mut reports = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            reports.push(self.reconcile(strategy.id).await?);
        }
        Ok(reports)
    }
}
