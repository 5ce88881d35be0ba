use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::strategy::StrategyId;
use crate::enums::ExecutionOutcome;
use crate::guard::GuardReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerEntryId(pub Uuid);

impl LedgerEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LedgerEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LedgerEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Input for appending one attempt outcome to the execution ledger.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub strategy_id: StrategyId,
    pub amount: Decimal,
    pub outcome: ExecutionOutcome,
    pub rejection_reason: Option<GuardReason>,
    pub failure_detail: Option<String>,
    pub transaction_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl NewLedgerEntry {
    /// An approved attempt the signing gateway confirmed.
    pub fn executed(
        strategy_id: StrategyId,
        amount: Decimal,
        transaction_ref: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            strategy_id,
            amount,
            outcome: ExecutionOutcome::ApprovedExecuted,
            rejection_reason: None,
            failure_detail: None,
            transaction_ref: Some(transaction_ref.into()),
            recorded_at,
        }
    }

    /// An approved attempt that failed or timed out downstream.
    pub fn failed_downstream(
        strategy_id: StrategyId,
        amount: Decimal,
        detail: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            strategy_id,
            amount,
            outcome: ExecutionOutcome::ApprovedFailedDownstream,
            rejection_reason: None,
            failure_detail: Some(detail.into()),
            transaction_ref: None,
            recorded_at,
        }
    }

    /// An attempt the guard refused.
    pub fn rejected(
        strategy_id: StrategyId,
        amount: Decimal,
        reason: GuardReason,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            strategy_id,
            amount,
            outcome: ExecutionOutcome::Rejected,
            rejection_reason: Some(reason),
            failure_detail: None,
            transaction_ref: None,
            recorded_at,
        }
    }
}

/// Immutable outcome record of one execution attempt.
///
/// The ledger is append-only; strategy counters are derived only from
/// `ApprovedExecuted` entries and history is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub strategy_id: StrategyId,
    pub amount: Decimal,
    pub outcome: ExecutionOutcome,
    pub rejection_reason: Option<GuardReason>,
    pub failure_detail: Option<String>,
    pub transaction_ref: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Materializes an entry from its append input.
    pub fn from_new(id: LedgerEntryId, entry: NewLedgerEntry) -> Self {
        Self {
            id,
            strategy_id: entry.strategy_id,
            amount: entry.amount,
            outcome: entry.outcome,
            rejection_reason: entry.rejection_reason,
            failure_detail: entry.failure_detail,
            transaction_ref: entry.transaction_ref,
            recorded_at: entry.recorded_at,
        }
    }

    /// Whether this entry counts toward a strategy's executed amount.
    pub fn counts_toward_spend(&self) -> bool {
        self.outcome == ExecutionOutcome::ApprovedExecuted
    }
}
