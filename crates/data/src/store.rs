//! Storage traits for the strategy store and execution ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use dca_domain::entities::{LedgerEntry, NewLedgerEntry, Strategy, StrategyConfig, StrategyId};
use dca_domain::enums::StrategyStatus;
use dca_domain::error::ValidationError;

/// Errors surfaced by storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("strategy {0} not found")]
    NotFound(StrategyId),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("invalid ledger entry: {0}")]
    InvalidEntry(String),

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Durable record of strategy configuration and execution counters.
///
/// Implementations must expose a single mutation path per strategy:
/// `apply_execution_result` and `set_status` are the only writers of the
/// mutable state, and each applies its change atomically.
#[async_trait]
pub trait StrategyStore: Send + Sync {
    /// Validates and persists a new strategy, counters zeroed, status
    /// active, first execution due one cadence period from `now`.
    async fn create(
        &self,
        config: StrategyConfig,
        now: DateTime<Utc>,
    ) -> Result<Strategy, StoreError>;

    async fn get(&self, id: StrategyId) -> Result<Option<Strategy>, StoreError>;

    /// All strategies, newest first.
    async fn list(&self) -> Result<Vec<Strategy>, StoreError>;

    /// Active strategies whose `next_execution` is at or before `now`.
    async fn list_due(&self, now: DateTime<Utc>) -> Result<Vec<Strategy>, StoreError>;

    /// Atomically applies a confirmed execution: increments the spend and
    /// count, stamps `last_execution`, recomputes `next_execution` from
    /// the execution timestamp, and transitions to completed once the
    /// remaining budget cannot fit another full per-execution amount.
    async fn apply_execution_result(
        &self,
        id: StrategyId,
        executed_amount: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Strategy, StoreError>;

    /// Sets active/paused. A no-op on completed strategies, which cannot
    /// be reactivated; returns the (possibly unchanged) strategy.
    async fn set_status(
        &self,
        id: StrategyId,
        status: StrategyStatus,
    ) -> Result<Strategy, StoreError>;

    /// Records a rule identifier returned by the remote policy registrar.
    async fn record_policy_rule(&self, id: StrategyId, rule_id: &str) -> Result<(), StoreError>;
}

/// Append-only audit trail of execution attempts.
#[async_trait]
pub trait ExecutionLedger: Send + Sync {
    /// Appends an outcome record. Never rejects on business rules, only
    /// on malformed input (a nil strategy reference).
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError>;

    /// Entries for a strategy, oldest first.
    async fn list_by_strategy(&self, id: StrategyId) -> Result<Vec<LedgerEntry>, StoreError>;

    /// Sum of approved-executed amounts for a strategy: the source of
    /// truth for reconstructing historical spend.
    async fn executed_total(&self, id: StrategyId) -> Result<Decimal, StoreError>;
}
