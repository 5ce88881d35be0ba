//! The guard -> sign -> record -> apply execution path.
//!
//! Every execution attempt for a strategy, scheduled or manual, funnels
//! through `ExecutionPipeline::execute` under that strategy's lock. The
//! lock spans guard evaluation through counter update, so two overlapping
//! sweep ticks, or a sweep racing a manual trigger, can never both pass
//! the budget check against a stale counter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use dca_data::store::{ExecutionLedger, StoreError, StrategyStore};
use dca_domain::entities::{ExecutionAttempt, NewLedgerEntry, Strategy, StrategyId};
use dca_domain::guard::{self, GuardDecision, GuardReason};
use dca_gateway::{SigningGateway, TradeIntent};

use crate::error::EngineError;

/// How an execution attempt was initiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Issued by a sweep tick for a due strategy.
    Scheduled,
    /// User-initiated "execute now"; skips the due check, never the guard.
    Manual,
}

/// Configuration for the execution pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Ceiling on how long a signing call may block.
    pub signing_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            signing_timeout: Duration::from_secs(30),
        }
    }
}

/// Outcome of one serialized execution attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionReport {
    /// Guard approved and the signing gateway confirmed.
    Executed {
        transaction_ref: String,
        executed_amount: Decimal,
    },
    /// Guard refused; counters untouched.
    Rejected { reason: GuardReason },
    /// Guard approved but the downstream call failed or timed out;
    /// counters untouched, the next sweep retries.
    FailedDownstream { detail: String },
}

impl ExecutionReport {
    pub fn is_executed(&self) -> bool {
        matches!(self, ExecutionReport::Executed { .. })
    }
}

/// Serialized executor for strategy attempts.
pub struct ExecutionPipeline {
    store: Arc<dyn StrategyStore>,
    ledger: Arc<dyn ExecutionLedger>,
    signer: Arc<dyn SigningGateway>,
    config: PipelineConfig,
    /// One lock per strategy; guard-evaluate through counter-apply runs as
    /// a critical section under it.
    locks: Mutex<HashMap<StrategyId, Arc<Mutex<()>>>>,
}

impl ExecutionPipeline {
    pub fn new(
        store: Arc<dyn StrategyStore>,
        ledger: Arc<dyn ExecutionLedger>,
        signer: Arc<dyn SigningGateway>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            signer,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, id: StrategyId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    /// Drives one scheduled attempt for a due strategy.
    pub async fn execute_scheduled(
        &self,
        id: StrategyId,
        now: DateTime<Utc>,
    ) -> Result<ExecutionReport, EngineError> {
        self.execute(id, Trigger::Scheduled, None, now).await
    }

    /// Drives a manual "execute now". The amount may be overridden, e.g.
    /// to fill the last slice of a nearly exhausted budget.
    pub async fn execute_manual(
        &self,
        id: StrategyId,
        amount: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<ExecutionReport, EngineError> {
        self.execute(id, Trigger::Manual, amount, now).await
    }

    async fn execute(
        &self,
        id: StrategyId,
        trigger: Trigger,
        amount: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<ExecutionReport, EngineError> {
        let lock = self.lock_for(id).await;
        let _serialized = lock.lock().await;

        let strategy = self
            .store
            .get(id)
            .await?
            .ok_or(StoreError::NotFound(id))
            .map_err(EngineError::from)?;

        let attempt = match trigger {
            Trigger::Scheduled => ExecutionAttempt::scheduled(&strategy, now),
            Trigger::Manual => ExecutionAttempt::manual(&strategy, amount, now),
        };

        if let GuardDecision::Rejected(reason) = guard::evaluate(&attempt, &strategy) {
            debug!(strategy = %id, ?trigger, reason = %reason, "attempt rejected");
            self.ledger
                .append(NewLedgerEntry::rejected(id, attempt.amount, reason, now))
                .await?;
            return Ok(ExecutionReport::Rejected { reason });
        }

        let signed = match timeout(
            self.config.signing_timeout,
            self.signer.sign(Self::intent(&strategy, &attempt)),
        )
        .await
        {
            Ok(Ok(signed)) => signed,
            Ok(Err(err)) => {
                warn!(strategy = %id, error = %err, "signing gateway failed");
                return self.record_downstream_failure(id, &attempt, err.to_string()).await;
            }
            Err(_) => {
                warn!(
                    strategy = %id,
                    timeout_secs = self.config.signing_timeout.as_secs(),
                    "signing gateway timed out"
                );
                let detail = format!(
                    "signing timed out after {}s",
                    self.config.signing_timeout.as_secs()
                );
                return self.record_downstream_failure(id, &attempt, detail).await;
            }
        };

        // Ledger first, counters second, always in that order: the entry
        // is the source of truth the counter is derived from.
        self.ledger
            .append(NewLedgerEntry::executed(
                id,
                attempt.amount,
                signed.transaction_ref.clone(),
                now,
            ))
            .await?;
        let updated = self
            .store
            .apply_execution_result(id, attempt.amount, now)
            .await?;

        info!(
            strategy = %id,
            tx = %signed.transaction_ref,
            executed_amount = %updated.executed_amount,
            total_budget = %updated.config.total_budget,
            status = %updated.status,
            "execution confirmed"
        );

        Ok(ExecutionReport::Executed {
            transaction_ref: signed.transaction_ref,
            executed_amount: attempt.amount,
        })
    }

    async fn record_downstream_failure(
        &self,
        id: StrategyId,
        attempt: &ExecutionAttempt,
        detail: String,
    ) -> Result<ExecutionReport, EngineError> {
        // Approval stands but counters stay put; next_execution was not
        // recomputed, so the next sweep tick retries promptly.
        self.ledger
            .append(NewLedgerEntry::failed_downstream(
                id,
                attempt.amount,
                detail.clone(),
                attempt.requested_at,
            ))
            .await?;
        Ok(ExecutionReport::FailedDownstream { detail })
    }

    fn intent(strategy: &Strategy, attempt: &ExecutionAttempt) -> TradeIntent {
        TradeIntent {
            wallet_address: attempt.wallet_address.clone(),
            source_token: attempt.pair.source.clone(),
            destination_token: attempt.pair.destination.clone(),
            amount: attempt.amount,
            max_gas_price: attempt.max_gas_price,
            network: strategy.config.network.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        config, epoch, setup, FailingSigner, HangingSigner, StaticSigner,
    };
    use chrono::Duration as ChronoDuration;
    use dca_domain::enums::{ExecutionOutcome, StrategyStatus};
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_execute_records_and_applies() {
        let (store, ledger, pipeline) = setup(StaticSigner::new("0xdead"));
        let strategy = store.create(config(), epoch()).await.unwrap();

        let report = pipeline
            .execute_manual(strategy.id, None, epoch())
            .await
            .unwrap();
        assert!(matches!(
            report,
            ExecutionReport::Executed { ref transaction_ref, executed_amount }
                if transaction_ref == "0xdead" && executed_amount == dec!(100)
        ));

        let updated = store.get(strategy.id).await.unwrap().unwrap();
        assert_eq!(updated.executed_amount, dec!(100));
        assert_eq!(updated.execution_count, 1);
        assert_eq!(updated.last_execution, Some(epoch()));

        let entries = ledger.list_by_strategy(strategy.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, ExecutionOutcome::ApprovedExecuted);
        assert_eq!(entries[0].transaction_ref.as_deref(), Some("0xdead"));
    }

    #[tokio::test]
    async fn test_rejection_is_recorded_without_touching_counters() {
        let (store, ledger, pipeline) = setup(StaticSigner::new("0xdead"));
        let strategy = store.create(config(), epoch()).await.unwrap();
        store
            .set_status(strategy.id, StrategyStatus::Paused)
            .await
            .unwrap();

        let report = pipeline
            .execute_manual(strategy.id, None, epoch())
            .await
            .unwrap();
        assert_eq!(
            report,
            ExecutionReport::Rejected {
                reason: GuardReason::StrategyNotActive
            }
        );

        let updated = store.get(strategy.id).await.unwrap().unwrap();
        assert_eq!(updated.executed_amount, Decimal::ZERO);

        let entries = ledger.list_by_strategy(strategy.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, ExecutionOutcome::Rejected);
        assert_eq!(
            entries[0].rejection_reason,
            Some(GuardReason::StrategyNotActive)
        );
    }

    #[tokio::test]
    async fn test_downstream_failure_leaves_counters_and_schedule() {
        // Scenario C: the gateway fails after approval.
        let (store, ledger, pipeline) = setup(FailingSigner::new("custody offline"));
        let strategy = store.create(config(), epoch()).await.unwrap();
        let due_at = strategy.next_execution;

        let report = pipeline
            .execute_scheduled(strategy.id, due_at)
            .await
            .unwrap();
        assert!(matches!(
            report,
            ExecutionReport::FailedDownstream { ref detail } if detail.contains("custody offline")
        ));

        let updated = store.get(strategy.id).await.unwrap().unwrap();
        assert_eq!(updated.executed_amount, Decimal::ZERO);
        assert_eq!(updated.execution_count, 0);
        // next_execution untouched: the strategy is still due and will be
        // retried on the very next sweep tick.
        assert_eq!(updated.next_execution, due_at);

        let entries = ledger.list_by_strategy(strategy.id).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].outcome,
            ExecutionOutcome::ApprovedFailedDownstream
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_signing_timeout_becomes_downstream_failure() {
        let (store, ledger, pipeline) = setup(HangingSigner);
        let strategy = store.create(config(), epoch()).await.unwrap();

        // Paused tokio time auto-advances when the runtime idles, so the
        // hanging signer trips the pipeline timeout immediately.
        let report = pipeline
            .execute_manual(strategy.id, None, epoch())
            .await
            .unwrap();
        assert!(matches!(
            report,
            ExecutionReport::FailedDownstream { ref detail } if detail.contains("timed out")
        ));

        let updated = store.get(strategy.id).await.unwrap().unwrap();
        assert_eq!(updated.executed_amount, Decimal::ZERO);

        let entries = ledger.list_by_strategy(strategy.id).await.unwrap();
        assert_eq!(
            entries[0].outcome,
            ExecutionOutcome::ApprovedFailedDownstream
        );
    }

    #[tokio::test]
    async fn test_concurrent_manual_triggers_cannot_double_spend() {
        // Budget fits exactly one execution; two racing triggers must
        // produce exactly one executed entry.
        let mut cfg = config();
        cfg.total_budget = dec!(100);
        let (store, ledger, pipeline) = setup(StaticSigner::new("0xrace"));
        let strategy = store.create(cfg, epoch()).await.unwrap();

        let first = pipeline.execute_manual(strategy.id, None, epoch());
        let second = pipeline.execute_manual(strategy.id, None, epoch());
        let (first, second) = tokio::join!(first, second);

        let executed = [first.unwrap(), second.unwrap()]
            .iter()
            .filter(|r| r.is_executed())
            .count();
        assert_eq!(executed, 1);

        let updated = store.get(strategy.id).await.unwrap().unwrap();
        assert_eq!(updated.executed_amount, dec!(100));
        assert_eq!(updated.status, StrategyStatus::Completed);
        assert!(updated.executed_amount <= updated.config.total_budget);

        assert_eq!(ledger.executed_total(strategy.id).await.unwrap(), dec!(100));
    }

    #[tokio::test]
    async fn test_manual_partial_fill_completes_budget() {
        // Tail of scenario A: 200/250 spent, a partial 50 lands and the
        // strategy completes.
        let (store, ledger, pipeline) = setup(StaticSigner::new("0xpartial"));
        let strategy = store.create(config(), epoch()).await.unwrap();

        let day = ChronoDuration::hours(24);
        pipeline
            .execute_manual(strategy.id, None, epoch())
            .await
            .unwrap();
        pipeline
            .execute_manual(strategy.id, None, epoch() + day)
            .await
            .unwrap();

        // A full third execution would breach the budget.
        let rejected = pipeline
            .execute_manual(strategy.id, None, epoch() + day * 2)
            .await
            .unwrap();
        assert_eq!(
            rejected,
            ExecutionReport::Rejected {
                reason: GuardReason::BudgetExhausted
            }
        );
        let still_active = store.get(strategy.id).await.unwrap().unwrap();
        assert_eq!(still_active.status, StrategyStatus::Active);

        let partial = pipeline
            .execute_manual(strategy.id, Some(dec!(50)), epoch() + day * 2)
            .await
            .unwrap();
        assert!(partial.is_executed());

        let completed = store.get(strategy.id).await.unwrap().unwrap();
        assert_eq!(completed.status, StrategyStatus::Completed);
        assert_eq!(completed.executed_amount, dec!(250));
        assert_eq!(ledger.executed_total(strategy.id).await.unwrap(), dec!(250));
    }

    #[tokio::test]
    async fn test_unknown_strategy_errors() {
        let (_store, _ledger, pipeline) = setup(StaticSigner::new("0x0"));
        let err = pipeline
            .execute_manual(StrategyId::new(), None, epoch())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
